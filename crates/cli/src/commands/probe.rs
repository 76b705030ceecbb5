//! `probe` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use contracts::ShutdownFlag;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ProbeArgs;
use crate::error::CliError;
use crate::session::{ProbeSession, QueryReport, SessionConfig};

/// JSON output of a probe run
#[derive(Serialize)]
struct ProbeOutput<'a> {
    duration_ms: f64,
    published: u64,
    failed: usize,
    queries: &'a [QueryReport],
}

/// Execute the `probe` command
pub async fn run_probe(args: &ProbeArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ms) = args.poll_interval_ms {
        if ms == 0 {
            return Err(CliError::config_validation("--poll-interval-ms must be > 0").into());
        }
        info!(poll_interval_ms = ms, "Overriding poll interval from CLI");
        blueprint.lookup.poll_interval_ms = ms;
    }

    info!(
        poll_interval_ms = blueprint.lookup.poll_interval_ms,
        frames = blueprint.static_transforms.len() + blueprint.broadcasters.len(),
        queries = blueprint.queries.len(),
        "Configuration loaded"
    );

    let session = ProbeSession::new(SessionConfig {
        blueprint,
        timeout_override: args.timeout_ms.map(Duration::from_millis),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    // Signals flip the flag instead of cancelling, so in-flight lookups
    // report the shutdown
    let shutdown = ShutdownFlag::new();
    let signal_flag = shutdown.clone();
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping probe...");
        signal_flag.trigger();
    });

    let report = session.run(shutdown).await.context("Probe execution failed")?;
    signal_task.abort();

    if args.json {
        let output = ProbeOutput {
            duration_ms: report.duration.as_secs_f64() * 1000.0,
            published: report.published,
            failed: report.failed_count(),
            queries: &report.queries,
        };
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize probe results")?;
        println!("{}", json);
    } else {
        report.print_results();
        report.print_summary();
    }

    let failed = report.failed_count();
    if failed > 0 {
        return Err(CliError::LookupsFailed {
            failed,
            total: report.queries.len(),
        }
        .into());
    }

    info!("Probe finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
