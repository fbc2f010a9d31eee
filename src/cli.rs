// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `workflow-engine`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "workflow-engine",
    version,
    about = "Run a pipeline of dependent commands, each as soon as its inputs succeeded.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WORKFLOW_ENGINE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the tasks, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a Graphviz rendering of the final task states to this file.
    #[arg(long, value_name = "PATH")]
    pub dot: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["workflow-engine"]).unwrap();
        assert_eq!(args.config, PathBuf::from("Workflow.toml"));
        assert_eq!(args.config, default_config_path());
        assert_eq!(args.log_level, None);
        assert!(!args.dry_run);
        assert!(args.dot.is_none());
    }

    #[test]
    fn all_flags() {
        let args = CliArgs::try_parse_from([
            "workflow-engine",
            "--config",
            "ci/pipeline.toml",
            "--log-level",
            "debug",
            "--dry-run",
            "--dot",
            "graph.dot",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("ci/pipeline.toml"));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(args.dry_run);
        assert_eq!(args.dot, Some(PathBuf::from("graph.dot")));
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(CliArgs::try_parse_from(["workflow-engine", "--log-level", "loud"]).is_err());
    }
}
