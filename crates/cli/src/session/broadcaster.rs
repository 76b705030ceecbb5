//! Simulated periodic transform publisher.

use std::time::Duration;

use contracts::{BroadcasterConfig, Liveness, StampedTransform, Timestamp};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;
use transform_buffer::TransformPublisher;

/// Publish `config.child` in `config.parent` until `running` reports stop,
/// `stop_after_ms` elapses, or the listener goes away. Returns the number of
/// messages published.
pub async fn run_broadcaster<L: Liveness>(
    config: BroadcasterConfig,
    publisher: TransformPublisher,
    running: L,
) -> u64 {
    if config.start_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.start_delay_ms)).await;
    }

    let started = Instant::now();
    let stop_after = config.stop_after_ms.map(Duration::from_millis);
    let mut ticker = tokio::time::interval(config.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut published = 0;

    loop {
        ticker.tick().await;
        if !running.is_running() {
            break;
        }

        let elapsed = started.elapsed();
        if stop_after.is_some_and(|limit| elapsed >= limit) {
            break;
        }

        let tf = StampedTransform::new(
            Timestamp::now(),
            config.parent.clone(),
            config.child.clone(),
            config.transform_at(elapsed),
        );
        if !publisher.publish(tf) {
            break;
        }
        published += 1;
    }

    debug!(
        parent = %config.parent,
        child = %config.child,
        published,
        "Broadcaster stopped"
    );
    published
}
