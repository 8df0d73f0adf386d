//! Error types for the tfrig CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for tfrig operations.
///
/// Each variant maps to a specific exit code. The runner only ever produces
/// `Spawn`, `StreamRead`, and `Wait`; `StepFailure` is raised by callers that
/// assert on an [`Outcome`](crate::runner::Outcome).
#[derive(Error, Debug)]
pub enum RigError {
    /// User provided invalid arguments, config, or an invalid invocation.
    #[error("{0}")]
    UserError(String),

    /// A lifecycle step exited non-zero or timed out.
    #[error("Step failed: {0}")]
    StepFailure(String),

    /// The external program could not be located or executed.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be drained from the spawned process.
    #[error("failed to read output of '{program}': {source}")]
    StreamRead {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The spawned process could not be waited on.
    #[error("failed to wait on '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RigError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RigError::UserError(_) => exit_codes::USER_ERROR,
            RigError::StepFailure(_) => exit_codes::STEP_FAILURE,
            RigError::Spawn { .. } => exit_codes::SPAWN_FAILURE,
            RigError::StreamRead { .. } | RigError::Wait { .. } => exit_codes::RUNNER_IO_FAILURE,
        }
    }
}

/// Result type alias for tfrig operations.
pub type Result<T> = std::result::Result<T, RigError>;
