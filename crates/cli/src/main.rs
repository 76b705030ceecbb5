//! # tf-wait CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 模拟 frame 发布与有界等待查询
//! - 优雅关闭处理 (Ctrl+C / SIGTERM 触发 ShutdownFlag)

mod cli;
mod commands;
mod error;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_probe, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "tf-wait starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Probe(args) => run_probe(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging settings from the global CLI flags
fn observability_config(cli: &Cli) -> observability::ObservabilityConfig {
    observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        verbosity: cli.verbose,
        quiet: cli.quiet,
        // probe enables metrics itself via --metrics-port
        metrics_port: None,
    }
}
