//! Probe results and statistics.

use std::time::Duration;

use contracts::{FrameId, LookupOutcome, LookupTime};
use observability::LookupMetricsAggregator;
use serde::Serialize;
use transform_buffer::BufferStats;

/// One query and how it ended
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub index: usize,
    pub target: FrameId,
    pub source: FrameId,
    pub requested: LookupTime,
    pub timeout_ms: u64,
    pub waited_ms: f64,
    pub outcome: LookupOutcome,
}

/// Statistics from a probe run
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Per-query results, in configuration order
    pub queries: Vec<QueryReport>,

    /// Messages published by the simulated broadcasters
    pub published: u64,

    /// Buffer state when the probe finished
    pub buffer: BufferStats,

    /// Total duration of the probe
    pub duration: Duration,

    /// Lookup metrics aggregator
    pub lookups: LookupMetricsAggregator,
}

impl ProbeReport {
    pub fn failed_count(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| !q.outcome.is_success())
            .count()
    }

    /// One line per query
    pub fn print_results(&self) {
        println!();
        for query in &self.queries {
            match &query.outcome {
                LookupOutcome::Success(tf) => {
                    let [x, y, z] = tf.transform.translation;
                    let [qx, qy, qz, qw] = tf.transform.rotation;
                    println!(
                        "✓ [{}] {} -> {} at {} after {:.1}ms: t=({:.3}, {:.3}, {:.3}) q=({:.3}, {:.3}, {:.3}, {:.3})",
                        query.index,
                        query.source,
                        query.target,
                        tf.stamp,
                        query.waited_ms,
                        x,
                        y,
                        z,
                        qx,
                        qy,
                        qz,
                        qw
                    );
                }
                LookupOutcome::Failure(failure) => {
                    println!("✗ [{}] {}", query.index, failure);
                }
            }
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Probe Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Queries: {}", self.queries.len());
        println!("   ├─ Failed: {}", self.failed_count());
        println!("   └─ Transforms published: {}", self.published);

        println!("\nBuffer");
        println!("   ├─ Frames: {} ({} static)", self.buffer.frame_count, self.buffer.static_count);
        println!("   ├─ Samples: {}", self.buffer.total_samples);
        println!("   ├─ Dropped: {}", self.buffer.dropped_count);
        println!("   └─ Out-of-order: {}", self.buffer.out_of_order_count);

        println!("\n{}", self.lookups.summary());
    }
}
