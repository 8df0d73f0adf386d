//! Configuration model for tfrig.
//!
//! This module defines the Config struct that represents `tfrig.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.
//!
//! The defaults reproduce the classic harness: `terraform init` once in the
//! current directory, then init/plan/apply/destroy per module with a
//! three-minute timeout per step.

use crate::error::{Result, RigError};
use crate::runner::Invocation;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a tfrig run.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provisioning tool binary to invoke (default: "terraform").
    pub tool: String,

    /// Directory whose immediate subdirectories are the test units.
    pub modules_dir: String,

    /// Wall-clock timeout per lifecycle step, in seconds. Must be positive.
    pub timeout_secs: u64,

    /// Whether to run `<tool> init` once in the current directory before
    /// iterating modules.
    pub setup: bool,

    /// Glob patterns for module directory names to skip.
    pub exclude: Vec<String>,

    /// Ordered lifecycle steps run inside each module directory.
    pub steps: Vec<StepConfig>,
}

/// One lifecycle step: `<tool> <subcommand> [extra_args...]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Tool subcommand (init, plan, apply, destroy, ...).
    pub subcommand: String,

    /// Extra flags appended to the subcommand, parsed with shell quoting
    /// rules (e.g. `"--auto-approve --var 'name=a b'"`).
    pub extra_args: String,
}

impl StepConfig {
    /// Create a step with no extra flags.
    pub fn new(subcommand: impl Into<String>) -> Self {
        Self {
            subcommand: subcommand.into(),
            extra_args: String::new(),
        }
    }

    /// Create a step with extra flags.
    pub fn with_args(subcommand: impl Into<String>, extra_args: impl Into<String>) -> Self {
        Self {
            subcommand: subcommand.into(),
            extra_args: extra_args.into(),
        }
    }

    /// Build the bounded invocation for this step in `dir`.
    pub fn invocation(&self, tool: &str, dir: &Path, timeout: Duration) -> Result<Invocation> {
        let extra = shell_words::split(&self.extra_args).map_err(|e| {
            RigError::UserError(format!(
                "failed to parse extra_args for step '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                self.subcommand, e
            ))
        })?;

        let mut command = Vec::with_capacity(2 + extra.len());
        command.push(tool.to_string());
        command.push(self.subcommand.clone());
        command.extend(extra);

        Ok(Invocation::new(command, timeout).in_dir(dir))
    }
}

fn default_tool() -> String {
    "terraform".to_string()
}

fn default_modules_dir() -> String {
    "modules".to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::new("init"),
        StepConfig::new("plan"),
        StepConfig::with_args("apply", "--auto-approve"),
        StepConfig::with_args("destroy", "--auto-approve"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            modules_dir: default_modules_dir(),
            timeout_secs: default_timeout_secs(),
            setup: true,
            exclude: Vec::new(),
            steps: default_steps(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward
    /// compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            RigError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| RigError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| RigError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return an error on invalid values.
    ///
    /// Validation rules:
    /// - `tool` must be non-empty
    /// - `timeout_secs` must be positive
    /// - `steps` must be non-empty, each with a non-empty subcommand
    /// - `exclude` patterns must be valid globs
    pub fn validate(&self) -> Result<()> {
        if self.tool.trim().is_empty() {
            return Err(RigError::UserError(
                "config validation failed: tool must be non-empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(RigError::UserError(
                "config validation failed: timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.steps.is_empty() {
            return Err(RigError::UserError(
                "config validation failed: steps must not be empty".to_string(),
            ));
        }

        for step in &self.steps {
            if step.subcommand.trim().is_empty() {
                return Err(RigError::UserError(
                    "config validation failed: every step needs a non-empty subcommand"
                        .to_string(),
                ));
            }
        }

        self.exclude_globs()?;

        Ok(())
    }

    /// The per-step timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Compile the exclude patterns into a glob set.
    pub fn exclude_globs(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            let glob = Glob::new(pattern).map_err(|e| {
                RigError::UserError(format!(
                    "config validation failed: invalid exclude glob '{}': {}",
                    pattern, e
                ))
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| {
            RigError::UserError(format!("failed to build exclude glob set: {}", e))
        })
    }
}
