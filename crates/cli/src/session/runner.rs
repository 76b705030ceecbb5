//! Probe session orchestrator - coordinates publishers, delivery and lookups.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use bounded_lookup::BoundedTransformLookup;
use contracts::{Liveness, ProbeBlueprint, ShutdownFlag, StampedTransform, Timestamp};
use observability::LookupMetricsAggregator;
use tracing::{info, warn};
use transform_buffer::{TransformBuffer, TransformListener, TransformPublisher};

use super::broadcaster::run_broadcaster;
use super::{ProbeReport, QueryReport};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The probe blueprint configuration
    pub blueprint: ProbeBlueprint,

    /// Replaces every query timeout (None = per-query / default timeout)
    pub timeout_override: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Runs one probe
pub struct ProbeSession {
    config: SessionConfig,
}

/// Running while both signals are
#[derive(Clone)]
struct Both<A, B>(A, B);

impl<A: Liveness, B: Liveness> Liveness for Both<A, B> {
    fn is_running(&self) -> bool {
        self.0.is_running() && self.1.is_running()
    }
}

impl ProbeSession {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run the probe to completion
    ///
    /// Triggering `shutdown` ends in-flight lookups with
    /// `ProcessShuttingDown` and stops the publishers; the report is still
    /// produced.
    pub async fn run(self, shutdown: ShutdownFlag) -> Result<ProbeReport> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let buffer = Arc::new(TransformBuffer::new(blueprint.buffer));
        let (listener, publisher) = TransformListener::new(buffer.clone());
        let listener_handle = tokio::spawn(listener.run());

        publish_static(blueprint, &publisher);

        // Publishers stop when the queries are done or on shutdown
        let queries_done = ShutdownFlag::new();
        let probe_start = Timestamp::now();
        let broadcaster_handles: Vec<_> = blueprint
            .broadcasters
            .iter()
            .cloned()
            .map(|config| {
                let running = Both(shutdown.clone(), queries_done.clone());
                tokio::spawn(run_broadcaster(config, publisher.clone(), running))
            })
            .collect();
        drop(publisher);

        info!(
            statics = blueprint.static_transforms.len(),
            broadcasters = broadcaster_handles.len(),
            queries = blueprint.queries.len(),
            "Probe started"
        );

        let lookup = BoundedTransformLookup::new(buffer.as_ref(), &shutdown).with_config(blueprint.lookup);
        let mut aggregator = LookupMetricsAggregator::new();
        let mut queries = Vec::with_capacity(blueprint.queries.len());

        for (index, query) in blueprint.queries.iter().enumerate() {
            let requested = query.time.resolve(probe_start);
            let timeout = self
                .config
                .timeout_override
                .or(query.timeout_ms.map(Duration::from_millis))
                .unwrap_or(blueprint.lookup.default_timeout());

            let started = Instant::now();
            let outcome = lookup
                .lookup(&query.target, &query.source, requested, timeout)
                .await;
            let waited = started.elapsed();

            aggregator.update(&outcome, waited);
            queries.push(QueryReport {
                index,
                target: query.target.clone(),
                source: query.source.clone(),
                requested,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                waited_ms: waited.as_secs_f64() * 1000.0,
                outcome,
            });
        }

        queries_done.trigger();

        let mut published = 0;
        for handle in broadcaster_handles {
            match handle.await {
                Ok(count) => published += count,
                Err(e) => warn!(error = %e, "Broadcaster task failed"),
            }
        }

        // All publishers are gone, so the listener drains and exits
        if let Err(e) = listener_handle.await {
            warn!(error = %e, "Listener task failed");
        }

        let stats = buffer.stats();
        observability::record_buffer_stats(stats.frame_count, stats.total_samples);

        Ok(ProbeReport {
            queries,
            published,
            buffer: stats,
            duration: start_time.elapsed(),
            lookups: aggregator,
        })
    }
}

fn publish_static(blueprint: &ProbeBlueprint, publisher: &TransformPublisher) {
    let stamp = Timestamp::now();
    for config in &blueprint.static_transforms {
        publisher.publish_static(StampedTransform::new(
            stamp,
            config.parent.clone(),
            config.child.clone(),
            config.transform(),
        ));
    }
}
