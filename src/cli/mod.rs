//! CLI argument parsing for tfrig.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tfrig: integration-test rig for infrastructure-as-code modules.
///
/// Each immediate subdirectory of the module root is one test unit. For
/// every unit, tfrig runs the provisioning tool's lifecycle subcommands
/// (init/plan/apply/destroy by default) with a bounded timeout per step,
/// and surfaces captured output only when a step fails.
#[derive(Parser, Debug)]
#[command(name = "tfrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for tfrig.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the lifecycle steps for every discovered module.
    ///
    /// A failed step aborts that module only; remaining modules still run.
    /// Exits non-zero if any module failed.
    Run(RunArgs),

    /// List the modules that would be run.
    ///
    /// Applies the same discovery and exclude rules as `run`.
    List(ListArgs),

    /// Execute a single command with a bounded timeout.
    ///
    /// Direct access to the bounded runner: prints the captured output and
    /// exits with a step failure if the command fails or times out.
    Exec(ExecArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the config file (default: ./tfrig.yaml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Module root directory (overrides `modules_dir` from the config).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Per-step timeout in seconds (overrides `timeout_secs` from the config).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Run only the named modules (repeatable).
    #[arg(long = "module")]
    pub modules: Vec<String>,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Path to the config file (default: ./tfrig.yaml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Module root directory (overrides `modules_dir` from the config).
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// Arguments for the `exec` command.
#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Working directory for the command.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Wall-clock timeout in seconds.
    #[arg(long, default_value_t = 180)]
    pub timeout_secs: u64,

    /// Command to execute (program followed by arguments).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::try_parse_from(["tfrig", "run"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.root.is_none());
            assert!(args.timeout_secs.is_none());
            assert!(args.modules.is_empty());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_full() {
        let cli = Cli::try_parse_from([
            "tfrig",
            "run",
            "--config",
            "ci/tfrig.yaml",
            "--root",
            "dist",
            "--timeout-secs",
            "60",
            "--module",
            "vpc",
            "--module",
            "dns",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("ci/tfrig.yaml")));
            assert_eq!(args.root, Some(PathBuf::from("dist")));
            assert_eq!(args.timeout_secs, Some(60));
            assert_eq!(args.modules, vec!["vpc", "dns"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["tfrig", "list", "--root", "modules"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.root, Some(PathBuf::from("modules")));
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn parse_exec_trailing_command() {
        let cli = Cli::try_parse_from([
            "tfrig",
            "exec",
            "--dir",
            "modules/vpc",
            "--timeout-secs",
            "30",
            "terraform",
            "plan",
            "--input=false",
        ])
        .unwrap();
        if let Command::Exec(args) = cli.command {
            assert_eq!(args.dir, PathBuf::from("modules/vpc"));
            assert_eq!(args.timeout_secs, 30);
            assert_eq!(args.command, vec!["terraform", "plan", "--input=false"]);
        } else {
            panic!("Expected Exec command");
        }
    }

    #[test]
    fn parse_exec_requires_a_command() {
        assert!(Cli::try_parse_from(["tfrig", "exec"]).is_err());
    }

    #[test]
    fn parse_exec_defaults() {
        let cli = Cli::try_parse_from(["tfrig", "exec", "true"]).unwrap();
        if let Command::Exec(args) = cli.command {
            assert_eq!(args.dir, PathBuf::from("."));
            assert_eq!(args.timeout_secs, 180);
            assert_eq!(args.command, vec!["true"]);
        } else {
            panic!("Expected Exec command");
        }
    }
}
