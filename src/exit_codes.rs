//! Exit code constants for the tfrig CLI.
//!
//! Each failure class gets its own exit code so CI wrappers can distinguish
//! "a module failed its lifecycle" from "the rig itself misbehaved":
//! - 0: Success
//! - 1: User error (bad args, invalid config, missing module root)
//! - 2: Step failure (non-zero exit or timeout in a lifecycle step)
//! - 3: Spawn failure (tool not found or not executable)
//! - 4: Runner I/O failure (output drain or process wait failed)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or missing module root.
pub const USER_ERROR: i32 = 1;

/// Step failure: a lifecycle step exited non-zero or timed out.
pub const STEP_FAILURE: i32 = 2;

/// Spawn failure: the provisioning tool could not be located or executed.
pub const SPAWN_FAILURE: i32 = 3;

/// Runner I/O failure: output streams could not be drained, or the
/// process could not be waited on.
pub const RUNNER_IO_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            STEP_FAILURE,
            SPAWN_FAILURE,
            RUNNER_IO_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_match_documented_values() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
        assert_eq!(STEP_FAILURE, 2);
        assert_eq!(SPAWN_FAILURE, 3);
        assert_eq!(RUNNER_IO_FAILURE, 4);
    }
}
