//! BoundedTransformLookup - poll a transform store until it can answer, the
//! deadline passes, or the host shuts down.

use std::time::Duration;

use contracts::{
    EventPump, FailureCause, FrameId, Liveness, LookupConfig, LookupFailure, LookupOutcome,
    LookupTime, NoPump, StampedTransform, Timestamp, TransformStore,
};
use tracing::{debug, error, instrument, trace, warn};

/// Bounded-wait transform lookup
///
/// Borrows the store and the liveness signal; holds no mutable state of its
/// own, so one instance can serve any number of concurrent lookups.
///
/// # Example
///
/// ```ignore
/// let lookup = BoundedTransformLookup::new(&buffer, &shutdown);
/// match lookup.lookup(&"map".into(), &"laser".into(), LookupTime::Latest, timeout).await {
///     LookupOutcome::Success(tf) => use_transform(tf),
///     LookupOutcome::Failure(f) if f.cause == FailureCause::ProcessShuttingDown => return,
///     LookupOutcome::Failure(f) => retry_later(f),
/// }
/// ```
pub struct BoundedTransformLookup<'a, S: ?Sized, L: ?Sized, P = NoPump> {
    store: &'a S,
    liveness: &'a L,
    pump: P,
    config: LookupConfig,
}

/// Result of one loop iteration
enum Step {
    Done(LookupOutcome),
    Wait,
}

/// Result of one capability check + fetch
enum Attempt {
    Ready(StampedTransform),
    Pending,
    Fault(String),
}

impl<'a, S, L> BoundedTransformLookup<'a, S, L, NoPump>
where
    S: TransformStore + ?Sized,
    L: Liveness + ?Sized,
{
    pub fn new(store: &'a S, liveness: &'a L) -> Self {
        Self {
            store,
            liveness,
            pump: NoPump,
            config: LookupConfig::default(),
        }
    }
}

impl<'a, S, L, P> BoundedTransformLookup<'a, S, L, P>
where
    S: TransformStore + ?Sized,
    L: Liveness + ?Sized,
    P: EventPump,
{
    pub fn with_config(mut self, config: LookupConfig) -> Self {
        self.config = config;
        self
    }

    /// Service `pump` on every wait of [`lookup_blocking`](Self::lookup_blocking)
    pub fn with_pump<Q: EventPump>(self, pump: Q) -> BoundedTransformLookup<'a, S, L, Q> {
        BoundedTransformLookup {
            store: self.store,
            liveness: self.liveness,
            pump,
            config: self.config,
        }
    }

    #[inline]
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Wait up to `timeout` for `source -> target` at `time`
    ///
    /// Yields to the runtime between polls so delivery tasks can fill the
    /// store. Never fails with an error: every failure is
    /// [`LookupOutcome::Failure`].
    #[instrument(
        level = "debug",
        name = "bounded_lookup",
        skip_all,
        fields(target = %target, source = %source, time = %time, timeout_ms = timeout.as_millis() as u64)
    )]
    pub async fn lookup(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
        timeout: Duration,
    ) -> LookupOutcome {
        let start = tokio::time::Instant::now();
        let mut polls = 0;

        loop {
            match self.step(target, source, time, timeout, start.elapsed(), &mut polls) {
                Step::Done(outcome) => return outcome,
                Step::Wait => {
                    let interval = self.config.poll_interval();
                    if interval.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        }
    }

    /// [`lookup`](Self::lookup) with `config.default_timeout`
    pub async fn lookup_with_default_timeout(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
    ) -> LookupOutcome {
        self.lookup(target, source, time, self.config.default_timeout())
            .await
    }

    /// Same semantics as [`lookup`](Self::lookup) for synchronous callers
    ///
    /// Each wait services the event pump, then sleeps the calling thread.
    #[instrument(
        level = "debug",
        name = "bounded_lookup_blocking",
        skip_all,
        fields(target = %target, source = %source, time = %time, timeout_ms = timeout.as_millis() as u64)
    )]
    pub fn lookup_blocking(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
        timeout: Duration,
    ) -> LookupOutcome {
        let start = std::time::Instant::now();
        let mut polls = 0;

        loop {
            match self.step(target, source, time, timeout, start.elapsed(), &mut polls) {
                Step::Done(outcome) => return outcome,
                Step::Wait => {
                    self.pump.spin_once();
                    let interval = self.config.poll_interval();
                    if interval.is_zero() {
                        std::thread::yield_now();
                    } else {
                        std::thread::sleep(interval);
                    }
                }
            }
        }
    }

    /// Liveness, then deadline, then the store
    ///
    /// The first tick always reaches the store, so a zero timeout still
    /// answers from data that is already there.
    fn step(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
        timeout: Duration,
        elapsed: Duration,
        polls: &mut u32,
    ) -> Step {
        if !self.liveness.is_running() {
            let failure = self.fail(target, source, time, elapsed, *polls, FailureCause::ProcessShuttingDown);
            return Step::Done(failure);
        }

        if *polls > 0 && elapsed > timeout {
            let failure = self.fail(target, source, time, elapsed, *polls, FailureCause::DeadlineExceeded);
            return Step::Done(failure);
        }

        *polls += 1;
        match self.attempt(target, source, time) {
            Attempt::Ready(tf) => {
                debug!(
                    wait_ms = elapsed.as_secs_f64() * 1000.0,
                    polls = *polls,
                    stamp = %tf.stamp,
                    "Transform resolved"
                );
                observability::record_lookup(observability::metrics::OUTCOME_SUCCESS, elapsed, *polls);
                Step::Done(LookupOutcome::Success(tf))
            }
            Attempt::Pending => Step::Wait,
            Attempt::Fault(message) => {
                let cause = FailureCause::StoreComputationFailed { message };
                Step::Done(self.fail(target, source, time, elapsed, *polls, cause))
            }
        }
    }

    fn attempt(&self, target: &FrameId, source: &FrameId, time: LookupTime) -> Attempt {
        if !self.store.can_transform(target, source, time) {
            return Attempt::Pending;
        }

        match self.store.lookup_transform(target, source, time) {
            Ok(tf) => Attempt::Ready(tf),
            // Data went away between check and fetch
            Err(e) if e.is_unavailable() => {
                trace!(error = %e, "Transform vanished after capability check");
                Attempt::Pending
            }
            Err(e) => {
                warn!(error = %e, "Transform store failed to resolve lookup");
                Attempt::Fault(e.to_string())
            }
        }
    }

    fn fail(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
        elapsed: Duration,
        polls: u32,
        cause: FailureCause,
    ) -> LookupOutcome {
        let failure = LookupFailure {
            target_frame: target.clone(),
            source_frame: source.clone(),
            requested: time,
            elapsed,
            latest_available: self.latest_available(target, source),
            cause,
        };

        error!(
            outcome = failure.cause.label(),
            polls,
            latest_available = ?failure.latest_available.map(|t| t.to_string()),
            "{failure}"
        );
        observability::record_lookup(failure.cause.label(), elapsed, polls);

        LookupOutcome::Failure(failure)
    }

    /// Best-effort diagnostic: newest time the pair resolves at, if any
    fn latest_available(&self, target: &FrameId, source: &FrameId) -> Option<Timestamp> {
        if !self.store.can_transform(target, source, LookupTime::Latest) {
            return None;
        }
        match self.store.lookup_transform(target, source, LookupTime::Latest) {
            Ok(tf) => Some(tf.stamp),
            Err(e) => {
                debug!(error = %e, "Diagnostic lookup at latest failed");
                None
            }
        }
    }
}
