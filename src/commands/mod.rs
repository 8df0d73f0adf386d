//! Command implementations for tfrig.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. The `run` harness lives in its own module; `list` and
//! `exec` are small enough to live here.

mod run;

use crate::cli::{Command, ExecArgs, ListArgs};
use crate::config::Config;
use crate::discover;
use crate::error::{Result, RigError};
use crate::runner::{self, Invocation, Outcome};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the current directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "tfrig.yaml";

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run::cmd_run(args).await,
        Command::List(args) => cmd_list(args),
        Command::Exec(args) => cmd_exec(args).await,
    }
}

/// Load the config for a command.
///
/// An explicit `--config` path must exist and parse. Without one, the
/// default file is used if present, and built-in defaults otherwise.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                Config::load(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Describe how a finished process exited, for error messages.
pub(crate) fn describe_exit(outcome: &Outcome) -> String {
    match outcome.exit_code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

fn cmd_list(args: ListArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let root = args
        .root
        .unwrap_or_else(|| PathBuf::from(&config.modules_dir));
    let units = discover::discover_modules(&root, &config.exclude_globs()?)?;

    if units.is_empty() {
        println!("No modules found under '{}'.", root.display());
        return Ok(());
    }

    println!("Modules under '{}' ({}):", root.display(), units.len());
    for unit in &units {
        println!("  {}  {}", unit.name, unit.path.display());
    }

    Ok(())
}

async fn cmd_exec(args: ExecArgs) -> Result<()> {
    let invocation =
        Invocation::new(args.command, Duration::from_secs(args.timeout_secs)).in_dir(args.dir);
    let outcome = runner::run(&invocation).await?;

    // Direct runner exposure: always relay what the process wrote.
    relay("stdout", &outcome.stdout, &mut std::io::stdout())?;
    relay("stderr", &outcome.stderr, &mut std::io::stderr())?;

    if outcome.timed_out {
        return Err(RigError::StepFailure(format!(
            "'{}' timed out after {}s",
            invocation.display(),
            args.timeout_secs
        )));
    }

    if !outcome.is_success() {
        return Err(RigError::StepFailure(format!(
            "'{}' exited with {}",
            invocation.display(),
            describe_exit(&outcome)
        )));
    }

    Ok(())
}

fn relay(name: &str, bytes: &[u8], sink: &mut impl Write) -> Result<()> {
    sink.write_all(bytes)
        .map_err(|e| RigError::UserError(format!("failed to relay captured {}: {}", name, e)))
}
