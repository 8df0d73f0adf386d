//! Bounded external-command execution.
//!
//! Executes one external command with a working directory and a wall-clock
//! timeout. The wait is a single bounded primitive (`tokio::time::timeout`
//! around `Child::wait`), not a poll loop. On timeout the process receives an
//! unconditional kill and the runner blocks until termination is confirmed,
//! so a child is never left running when [`run`] returns.
//!
//! Both output streams are drained unconditionally by concurrent reader
//! tasks, regardless of exit status. The runner never logs and never
//! interprets exit codes; callers decide what counts as failure and what to
//! surface from the captured output.

use crate::error::{Result, RigError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Description of one external command execution request.
///
/// Immutable once constructed; build one per lifecycle step.
#[derive(Debug, Clone)]
pub struct Invocation {
    command: Vec<String>,
    working_directory: Option<PathBuf>,
    timeout: Duration,
}

impl Invocation {
    /// Create an invocation for `command` (program + arguments) bounded by
    /// `timeout`. The working directory defaults to the current directory.
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            working_directory: None,
            timeout,
        }
    }

    /// Set the working directory the process is spawned in.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// The full command line (program + arguments).
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// The program name, if the command is non-empty.
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// The working directory, if one was set.
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// The wall-clock timeout for this invocation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Human-readable command line for error messages.
    pub fn display(&self) -> String {
        self.command.join(" ")
    }
}

/// Result record of one completed or forcibly-terminated execution.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Exit code of the process. `None` is the forced-termination sentinel
    /// (killed on timeout, or terminated by a signal).
    pub exit_code: Option<i32>,
    /// Everything the process wrote to stdout, drained unconditionally.
    pub stdout: Vec<u8>,
    /// Everything the process wrote to stderr, drained unconditionally.
    pub stderr: Vec<u8>,
    /// Whether the timeout elapsed and the process was killed.
    pub timed_out: bool,
    /// Wall-clock duration from spawn to confirmed termination.
    pub duration: Duration,
}

impl Outcome {
    /// Whether the process completed within the timeout with exit code 0.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Captured stdout as lossy UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Captured stderr as lossy UTF-8.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Execute an invocation to completion or forced termination.
///
/// Returns an [`Outcome`] for both the completed and the timed-out case;
/// timeout is data, not an error. Errors are reserved for the rig itself
/// misbehaving:
///
/// * [`RigError::UserError`] - empty command, zero timeout, or a working
///   directory that does not exist (checked before spawning).
/// * [`RigError::Spawn`] - the program could not be located or executed.
/// * [`RigError::StreamRead`] / [`RigError::Wait`] - output could not be
///   drained or the process could not be waited on.
pub async fn run(invocation: &Invocation) -> Result<Outcome> {
    let Some((program, args)) = invocation.command.split_first() else {
        return Err(RigError::UserError(
            "invocation command must not be empty".to_string(),
        ));
    };

    if invocation.timeout.is_zero() {
        return Err(RigError::UserError(
            "invocation timeout must be a positive duration".to_string(),
        ));
    }

    if let Some(dir) = &invocation.working_directory
        && !dir.is_dir()
    {
        return Err(RigError::UserError(format!(
            "working directory '{}' does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &invocation.working_directory {
        command.current_dir(dir);
    }

    let start = Instant::now();
    let mut child = command.spawn().map_err(|e| RigError::Spawn {
        program: program.clone(),
        source: e,
    })?;

    // Both streams were requested piped above, so take() only fails if the
    // pipes were never set up.
    let stdout_pipe = child.stdout.take().ok_or_else(|| RigError::StreamRead {
        program: program.clone(),
        source: std::io::Error::other("stdout pipe was not captured"),
    })?;
    let stderr_pipe = child.stderr.take().ok_or_else(|| RigError::StreamRead {
        program: program.clone(),
        source: std::io::Error::other("stderr pipe was not captured"),
    })?;

    // Drain both streams concurrently with the wait. Reading on separate
    // tasks keeps the child from blocking on a full pipe while we wait.
    let stdout_task = spawn_drain(stdout_pipe);
    let stderr_task = spawn_drain(stderr_pipe);

    let (exit_code, timed_out) =
        match tokio::time::timeout(invocation.timeout, child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|e| RigError::Wait {
                    program: program.clone(),
                    source: e,
                })?;
                (status.code(), false)
            }
            Err(_elapsed) => {
                // Unconditional kill. The child may exit on its own between
                // the timeout firing and the signal landing, so a start_kill
                // failure is ignored; the wait below confirms termination
                // either way.
                let _ = child.start_kill();
                child.wait().await.map_err(|e| RigError::Wait {
                    program: program.clone(),
                    source: e,
                })?;
                (None, true)
            }
        };

    // Termination is confirmed, so both pipes are at EOF and these joins
    // cannot block indefinitely.
    let stdout = join_drain(stdout_task, program).await?;
    let stderr = join_drain(stderr_task, program).await?;

    Ok(Outcome {
        exit_code,
        stdout,
        stderr,
        timed_out,
        duration: start.elapsed(),
    })
}

fn spawn_drain<R>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn join_drain(
    task: JoinHandle<std::io::Result<Vec<u8>>>,
    program: &str,
) -> Result<Vec<u8>> {
    task.await
        .map_err(|e| RigError::StreamRead {
            program: program.to_string(),
            source: std::io::Error::other(e),
        })?
        .map_err(|e| RigError::StreamRead {
            program: program.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn invocation(command: &[&str], timeout_secs: u64) -> Invocation {
        Invocation::new(
            command.iter().map(|s| s.to_string()).collect(),
            Duration::from_secs(timeout_secs),
        )
    }

    #[tokio::test]
    async fn trivial_success_tool_exits_zero() {
        let outcome = run(&invocation(&["true"], 5)).await.unwrap();
        assert_eq!(outcome.exit_code, Some(0));
        assert!(!outcome.timed_out);
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn failing_tool_reports_real_exit_code() {
        let outcome = run(&invocation(&["false"], 5)).await.unwrap();
        assert_eq!(outcome.exit_code, Some(1));
        assert!(!outcome.timed_out);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn captures_stdout_exactly() {
        let outcome = run(&invocation(&["echo", "hello"], 5)).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.stdout, b"hello\n");
        assert!(outcome.stderr.is_empty());
    }

    #[tokio::test]
    async fn captures_stderr_on_success_path() {
        // stderr must be drained even when the command succeeds.
        let outcome = run(&invocation(&["sh", "-c", "echo warn >&2"], 5))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.stderr, b"warn\n");
        assert!(outcome.stdout.is_empty());
    }

    #[tokio::test]
    async fn captures_both_streams_on_failure() {
        let outcome = run(&invocation(&["sh", "-c", "echo out; echo err >&2; exit 3"], 5))
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stdout, b"out\n");
        assert_eq!(outcome.stderr, b"err\n");
    }

    #[tokio::test]
    async fn timeout_kills_process_and_bounds_wall_clock() {
        let start = Instant::now();
        let outcome = run(&invocation(&["sleep", "10"], 1)).await.unwrap();
        let elapsed = start.elapsed();

        assert!(outcome.timed_out);
        assert_eq!(outcome.exit_code, None);
        // Bounded by the timeout plus termination overhead, far below the
        // child's natural 10s runtime.
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(5), "elapsed: {:?}", elapsed);
        assert!(outcome.duration < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn timeout_preserves_output_written_before_kill() {
        let outcome = run(&invocation(&["sh", "-c", "echo early; sleep 10"], 1))
            .await
            .unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.stdout, b"early\n");
    }

    #[tokio::test]
    async fn nonexistent_program_fails_with_spawn_error() {
        let err = run(&invocation(&["tfrig-no-such-program-xyz"], 5))
            .await
            .unwrap_err();
        assert!(matches!(err, RigError::Spawn { .. }));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let err = run(&Invocation::new(vec![], Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, RigError::UserError(_)));
    }

    #[tokio::test]
    async fn zero_timeout_is_rejected() {
        let err = run(&Invocation::new(
            vec!["true".to_string()],
            Duration::ZERO,
        ))
        .await
        .unwrap_err();
        assert!(matches!(err, RigError::UserError(_)));
    }

    #[tokio::test]
    async fn missing_working_directory_is_rejected() {
        let inv = invocation(&["true"], 5).in_dir("/definitely/not/a/dir");
        let err = run(&inv).await.unwrap_err();
        assert!(matches!(err, RigError::UserError(_)));
    }

    #[tokio::test]
    async fn runs_in_the_given_working_directory() {
        let temp = TempDir::new().unwrap();
        let inv = invocation(&["pwd"], 5).in_dir(temp.path());
        let outcome = run(&inv).await.unwrap();
        assert!(outcome.is_success());

        let reported = std::path::PathBuf::from(outcome.stdout_lossy().trim());
        // pwd may report the resolved path (e.g. /private on macOS).
        assert_eq!(
            reported.canonicalize().unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn identical_invocations_yield_identical_exit_codes() {
        let inv = invocation(&["sh", "-c", "exit 7"], 5);
        let first = run(&inv).await.unwrap();
        let second = run(&inv).await.unwrap();
        assert_eq!(first.exit_code, Some(7));
        assert_eq!(first.exit_code, second.exit_code);
        assert_eq!(first.timed_out, second.timed_out);
    }

    #[test]
    fn invocation_accessors() {
        let inv = invocation(&["terraform", "plan"], 180).in_dir("/tmp");
        assert_eq!(inv.program(), Some("terraform"));
        assert_eq!(inv.command().len(), 2);
        assert_eq!(inv.timeout(), Duration::from_secs(180));
        assert_eq!(inv.working_directory(), Some(Path::new("/tmp")));
        assert_eq!(inv.display(), "terraform plan");
    }

    #[test]
    fn outcome_success_requires_zero_exit_and_no_timeout() {
        let outcome = Outcome {
            exit_code: Some(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
            timed_out: false,
            duration: Duration::from_millis(10),
        };
        assert!(outcome.is_success());

        let failed = Outcome {
            exit_code: Some(1),
            ..outcome.clone()
        };
        assert!(!failed.is_success());

        let killed = Outcome {
            exit_code: None,
            timed_out: true,
            ..outcome
        };
        assert!(!killed.is_success());
    }
}
