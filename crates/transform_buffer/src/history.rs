//! Per-frame transform history with time-based retention.
//!
//! Each frame stores its pose relative to its parent, keyed by stamp:
//! - BTreeMap keeps samples ordered even when they arrive out of order
//! - Samples older than `newest - cache_time` are evicted on insert
//! - `max_samples` bounds memory for high-rate publishers

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use contracts::{FrameId, Timestamp, Transform, TransformError};
use nalgebra::Isometry3;

use crate::math::{interpolate, to_isometry};

/// History of one frame relative to its parent
pub struct FrameHistory {
    child: FrameId,
    parent: FrameId,
    samples: BTreeMap<Timestamp, Transform>,
    is_static: bool,
    max_samples: usize,
    dropped_count: u64,
    out_of_order_count: u64,
    last_timestamp: Option<Timestamp>,
}

impl fmt::Debug for FrameHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameHistory")
            .field("child", &self.child)
            .field("parent", &self.parent)
            .field("len", &self.samples.len())
            .field("static", &self.is_static)
            .field("dropped", &self.dropped_count)
            .finish()
    }
}

impl FrameHistory {
    /// Create an empty dynamic history
    pub fn new(child: FrameId, parent: FrameId, max_samples: usize) -> Self {
        Self {
            child,
            parent,
            samples: BTreeMap::new(),
            is_static: false,
            max_samples: max_samples.max(1),
            dropped_count: 0,
            out_of_order_count: 0,
            last_timestamp: None,
        }
    }

    /// Create a static history holding a single transform valid at all times
    pub fn new_static(child: FrameId, parent: FrameId, stamp: Timestamp, tf: Transform) -> Self {
        let mut history = Self::new(child, parent, 1);
        history.is_static = true;
        history.samples.insert(stamp, tf);
        history.last_timestamp = Some(stamp);
        history
    }

    #[inline]
    pub fn parent(&self) -> &FrameId {
        &self.parent
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Insert a sample
    ///
    /// # Errors
    /// `StaleData` if the sample is older than the retention window.
    pub fn push(
        &mut self,
        stamp: Timestamp,
        tf: Transform,
        cache_time: Duration,
    ) -> Result<(), TransformError> {
        if let Some(newest) = self.newest_stamp() {
            let oldest_allowed = newest.saturating_sub(cache_time);
            if stamp < oldest_allowed {
                self.dropped_count += 1;
                return Err(TransformError::StaleData {
                    frame: self.child.clone(),
                    stamp,
                    oldest: self.oldest_stamp().unwrap_or(oldest_allowed),
                });
            }
        }

        if let Some(last) = self.last_timestamp {
            if stamp < last {
                self.out_of_order_count += 1;
            }
        }
        self.last_timestamp = Some(stamp);

        self.samples.insert(stamp, tf);
        self.evict_expired(cache_time);

        while self.samples.len() > self.max_samples {
            self.samples.pop_first();
            self.dropped_count += 1;
        }
        Ok(())
    }

    /// Evict samples older than `newest - cache_time`
    pub fn evict_expired(&mut self, cache_time: Duration) -> usize {
        let Some(newest) = self.newest_stamp() else {
            return 0;
        };
        let cutoff = newest.saturating_sub(cache_time);
        let retained = self.samples.split_off(&cutoff);
        let evicted = self.samples.len();
        self.samples = retained;
        self.dropped_count += evicted as u64;
        evicted
    }

    /// Pose of this frame in its parent at `stamp`
    ///
    /// Static histories answer for any stamp. Dynamic histories interpolate
    /// between the bracketing samples and never extrapolate.
    pub fn sample_at(&self, stamp: Timestamp) -> Result<Isometry3<f64>, TransformError> {
        if self.is_static {
            return self
                .samples
                .values()
                .next_back()
                .map(to_isometry)
                .ok_or_else(|| TransformError::NoData(self.child.clone()));
        }

        let before = self.samples.range(..=stamp).next_back();
        let after = self.samples.range(stamp..).next();

        match (before, after) {
            (Some((t0, tf0)), Some((t1, tf1))) => {
                if t0 == t1 {
                    return Ok(to_isometry(tf0));
                }
                let span = (*t1 - *t0).as_nanos() as f64;
                let ratio = (stamp - *t0).as_nanos() as f64 / span;
                Ok(interpolate(&to_isometry(tf0), &to_isometry(tf1), ratio))
            }
            (None, Some((oldest, _))) => Err(TransformError::ExtrapolationPast {
                frame: self.child.clone(),
                requested: stamp,
                oldest: *oldest,
            }),
            (Some((newest, _)), None) => Err(TransformError::ExtrapolationFuture {
                frame: self.child.clone(),
                requested: stamp,
                newest: *newest,
            }),
            (None, None) => Err(TransformError::NoData(self.child.clone())),
        }
    }

    /// Newest sample stamp
    #[inline]
    pub fn newest_stamp(&self) -> Option<Timestamp> {
        self.samples.keys().next_back().copied()
    }

    /// Oldest sample stamp
    #[inline]
    pub fn oldest_stamp(&self) -> Option<Timestamp> {
        self.samples.keys().next().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get dropped sample count (stale, expired or over capacity)
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Get out-of-order sample count
    #[inline]
    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order_count
    }
}
