//! TransformStore trait - the time-indexed store a lookup polls
//!
//! The store is filled concurrently by a delivery layer. Implementations must
//! tolerate concurrent readers while being written to; callers of this trait
//! never mutate it.

use std::sync::Arc;

use crate::{FrameId, LookupTime, StampedTransform, TransformError};

/// Read side of a transform store.
///
/// Both queries must be non-blocking or bounded-fast: they are called from a
/// poll loop that has a deadline to honour.
pub trait TransformStore: Send + Sync {
    /// Whether `lookup_transform` would succeed right now.
    fn can_transform(&self, target: &FrameId, source: &FrameId, time: LookupTime) -> bool;

    /// Resolve the transform mapping `source` into `target` at `time`.
    ///
    /// # Errors
    /// An error for which [`TransformError::is_unavailable`] holds when the
    /// data is not there yet; any other variant for computation faults.
    fn lookup_transform(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
    ) -> Result<StampedTransform, TransformError>;
}

impl<S: TransformStore + ?Sized> TransformStore for &S {
    fn can_transform(&self, target: &FrameId, source: &FrameId, time: LookupTime) -> bool {
        (**self).can_transform(target, source, time)
    }

    fn lookup_transform(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
    ) -> Result<StampedTransform, TransformError> {
        (**self).lookup_transform(target, source, time)
    }
}

impl<S: TransformStore + ?Sized> TransformStore for Arc<S> {
    fn can_transform(&self, target: &FrameId, source: &FrameId, time: LookupTime) -> bool {
        (**self).can_transform(target, source, time)
    }

    fn lookup_transform(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
    ) -> Result<StampedTransform, TransformError> {
        (**self).lookup_transform(target, source, time)
    }
}

/// Pending-work servicing hook for synchronous waiters.
///
/// A thread that blocks in a poll loop while also owning the delivery queue
/// calls `spin_once` on every wait so queued transforms reach the store.
pub trait EventPump {
    /// Process whatever work is pending without blocking.
    fn spin_once(&self);
}

/// Pump for hosts whose delivery runs elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPump;

impl EventPump for NoPump {
    #[inline]
    fn spin_once(&self) {}
}

impl<P: EventPump + ?Sized> EventPump for &P {
    #[inline]
    fn spin_once(&self) {
        (**self).spin_once()
    }
}

impl<P: EventPump + ?Sized> EventPump for Arc<P> {
    #[inline]
    fn spin_once(&self) {
        (**self).spin_once()
    }
}
