//! The `run` command: module iteration and lifecycle execution.
//!
//! One bounded runner invocation per lifecycle step, sequenced per module.
//! A failed step aborts the remaining steps of that module only; other
//! modules continue independently. Captured output is surfaced as error
//! records only when a step failed, so passing runs stay quiet.

use crate::cli::RunArgs;
use crate::config::{Config, StepConfig};
use crate::discover::{self, TestUnit};
use crate::error::{Result, RigError};
use crate::runner::{self, Outcome};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_ref())?;
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    // Re-validate after CLI overrides (catches --timeout-secs 0).
    config.validate()?;

    let root = args
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.modules_dir));
    let mut units = discover::discover_modules(&root, &config.exclude_globs()?)?;

    if !args.modules.is_empty() {
        let unknown: Vec<String> = args
            .modules
            .iter()
            .filter(|name| !units.iter().any(|u| &u.name == *name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(RigError::UserError(format!(
                "unknown module(s) under '{}': {}",
                root.display(),
                unknown.join(", ")
            )));
        }
        units.retain(|u| args.modules.contains(&u.name));
    }

    if units.is_empty() {
        info!(root = %root.display(), "no modules to run");
        return Ok(());
    }

    if config.setup {
        run_setup(&config).await?;
    }

    let mut failed = Vec::new();
    for unit in &units {
        info!(module = %unit.name, "running lifecycle");
        match run_module(&config, unit).await {
            Ok(()) => info!(module = %unit.name, "passed"),
            Err(err) => {
                error!(module = %unit.name, "failed: {}", err);
                failed.push(unit.name.clone());
            }
        }
    }

    info!(
        passed = units.len() - failed.len(),
        failed = failed.len(),
        "run complete"
    );

    if failed.is_empty() {
        Ok(())
    } else {
        Err(RigError::StepFailure(format!(
            "{}/{} module(s) failed: {}",
            failed.len(),
            units.len(),
            failed.join(", ")
        )))
    }
}

/// One-time `<tool> init` in the current directory before module iteration.
/// A setup failure aborts the whole run.
async fn run_setup(config: &Config) -> Result<()> {
    let step = StepConfig::new("init");
    let invocation = step.invocation(&config.tool, Path::new("."), config.timeout())?;

    info!(command = %invocation.display(), "running setup");
    let outcome = runner::run(&invocation).await?;
    if !outcome.is_success() {
        log_failure("setup", &step.subcommand, &outcome);
        return Err(step_error("setup", &step, config.timeout_secs, &outcome));
    }

    Ok(())
}

/// Run the configured lifecycle steps inside one module directory, in order.
async fn run_module(config: &Config, unit: &TestUnit) -> Result<()> {
    for step in &config.steps {
        let invocation = step.invocation(&config.tool, &unit.path, config.timeout())?;

        debug!(module = %unit.name, command = %invocation.display(), "running step");
        let outcome = runner::run(&invocation).await?;
        if !outcome.is_success() {
            log_failure(&unit.name, &step.subcommand, &outcome);
            return Err(step_error(&unit.name, step, config.timeout_secs, &outcome));
        }
    }

    Ok(())
}

/// Emit captured output as error records. Only called for failed steps;
/// the success path never logs process output.
fn log_failure(module: &str, step: &str, outcome: &Outcome) {
    let stdout = outcome.stdout_lossy();
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        error!(module, step, "stdout:\n{}", stdout);
    }

    let stderr = outcome.stderr_lossy();
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        error!(module, step, "stderr:\n{}", stderr);
    }
}

fn step_error(module: &str, step: &StepConfig, timeout_secs: u64, outcome: &Outcome) -> RigError {
    if outcome.timed_out {
        RigError::StepFailure(format!(
            "{} in module '{}' timed out after {}s",
            step.subcommand, module, timeout_secs
        ))
    } else {
        RigError::StepFailure(format!(
            "{} in module '{}' exited with {}",
            step.subcommand,
            module,
            super::describe_exit(outcome)
        ))
    }
}
