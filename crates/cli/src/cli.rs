//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tf-wait - bounded-wait transform lookups against a simulated frame tree
#[derive(Parser, Debug)]
#[command(
    name = "tf-wait",
    author,
    version,
    about = "Bounded-wait coordinate transform lookups",
    long_about = "Publishes the frames described in a probe configuration into a time-indexed \n\
                  transform buffer, then runs each configured lookup with a deadline and \n\
                  reports whether it resolved, timed out, or was interrupted."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TF_WAIT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TF_WAIT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish the configured frames and run the configured lookups
    Probe(ProbeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `probe` command
#[derive(Parser, Debug, Clone)]
pub struct ProbeArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "probe.toml", env = "TF_WAIT_CONFIG")]
    pub config: PathBuf,

    /// Override every query timeout (milliseconds)
    #[arg(long, env = "TF_WAIT_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Override the poll interval from configuration (milliseconds)
    #[arg(long, env = "TF_WAIT_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Print query results as JSON
    #[arg(long)]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TF_WAIT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "probe.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "probe.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_args() {
        let cli = Cli::parse_from([
            "tf-wait",
            "-v",
            "probe",
            "-c",
            "robot.toml",
            "--timeout-ms",
            "50",
            "--json",
        ]);

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Probe(args) => {
                assert_eq!(args.config, PathBuf::from("robot.toml"));
                assert_eq!(args.timeout_ms, Some(50));
                assert!(args.json);
                assert_eq!(args.metrics_port, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["tf-wait", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
