//! TransformBuffer - in-memory time-indexed transform store.
//!
//! Frames form a forest: every published child has exactly one parent. A
//! lookup walks both frames up to their closest common ancestor and
//! composes the edges at the requested time.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use contracts::{
    BufferConfig, FrameId, LookupTime, StampedTransform, Timestamp, TransformError,
    TransformStore,
};
use nalgebra::Isometry3;
use tracing::{debug, instrument, trace};

use crate::history::FrameHistory;
use crate::math::from_isometry;

/// Parent chains longer than this are treated as loops
const MAX_GRAPH_DEPTH: usize = 1000;

type FrameMap = HashMap<FrameId, FrameHistory>;

/// Buffer status (for diagnostics)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferStats {
    /// Frames with a parent (one history each)
    pub frame_count: usize,

    /// Of which static
    pub static_count: usize,

    /// Total buffered samples
    pub total_samples: usize,

    /// Oldest dynamic sample
    pub oldest_timestamp: Option<Timestamp>,

    /// Newest dynamic sample
    pub newest_timestamp: Option<Timestamp>,

    /// Dropped samples (stale, expired, over capacity)
    pub dropped_count: u64,

    /// Out-of-order samples
    pub out_of_order_count: u64,
}

/// Thread-safe transform store
///
/// Readers never block each other; a writer excludes readers only for the
/// duration of one insertion.
#[derive(Debug)]
pub struct TransformBuffer {
    config: BufferConfig,
    cache_time: Duration,
    frames: RwLock<FrameMap>,
}

impl TransformBuffer {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            cache_time: config.cache_time(),
            config,
            frames: RwLock::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Insert a dynamic transform
    ///
    /// Publishing a known child under a new parent reparents it and discards
    /// its history.
    ///
    /// # Errors
    /// `InvalidTransform` for malformed input, `StaleData` for samples older
    /// than the retention window.
    #[instrument(
        level = "trace",
        name = "transform_buffer_set",
        skip(self, tf),
        fields(parent = %tf.parent, child = %tf.child, stamp = %tf.stamp)
    )]
    pub fn set_transform(&self, tf: StampedTransform, authority: &str) -> Result<(), TransformError> {
        validate(&tf)?;

        let mut frames = self.write();
        let history = frames
            .entry(tf.child.clone())
            .or_insert_with(|| FrameHistory::new(tf.child.clone(), tf.parent.clone(), self.config.max_samples));

        if history.parent() != &tf.parent || history.is_static() {
            debug!(
                child = %tf.child,
                old_parent = %history.parent(),
                new_parent = %tf.parent,
                authority,
                "Replacing frame history"
            );
            *history = FrameHistory::new(tf.child.clone(), tf.parent.clone(), self.config.max_samples);
        }

        history.push(tf.stamp, tf.transform, self.cache_time)?;
        trace!(authority, "Transform stored");
        Ok(())
    }

    /// Insert a transform valid at every time
    ///
    /// # Errors
    /// `InvalidTransform` for malformed input.
    pub fn set_static_transform(
        &self,
        tf: StampedTransform,
        authority: &str,
    ) -> Result<(), TransformError> {
        validate(&tf)?;

        debug!(parent = %tf.parent, child = %tf.child, authority, "Static transform stored");
        let history = FrameHistory::new_static(tf.child.clone(), tf.parent, tf.stamp, tf.transform);
        self.write().insert(tf.child, history);
        Ok(())
    }

    /// All known frames (children and roots), sorted
    pub fn frames(&self) -> Vec<FrameId> {
        let frames = self.read();
        let names: BTreeSet<&str> = frames
            .iter()
            .flat_map(|(child, history)| [child.as_str(), history.parent().as_str()])
            .collect();
        names.into_iter().map(FrameId::from).collect()
    }

    /// Whether the frame was ever published as a child or a parent
    pub fn frame_exists(&self, frame: &str) -> bool {
        is_known(&self.read(), frame)
    }

    /// Current buffer statistics
    pub fn stats(&self) -> BufferStats {
        let frames = self.read();
        let mut stats = BufferStats {
            frame_count: frames.len(),
            ..Default::default()
        };

        for history in frames.values() {
            stats.total_samples += history.len();
            stats.dropped_count += history.dropped_count();
            stats.out_of_order_count += history.out_of_order_count();

            if history.is_static() {
                stats.static_count += 1;
                continue;
            }
            stats.oldest_timestamp = min_opt(stats.oldest_timestamp, history.oldest_stamp());
            stats.newest_timestamp = max_opt(stats.newest_timestamp, history.newest_stamp());
        }
        stats
    }

    /// Drop every frame
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, FrameMap> {
        // A panicking writer leaves each history internally consistent
        self.frames.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FrameMap> {
        self.frames.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TransformBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}

impl TransformStore for TransformBuffer {
    fn can_transform(&self, target: &FrameId, source: &FrameId, time: LookupTime) -> bool {
        resolve(&self.read(), target, source, time).is_ok()
    }

    fn lookup_transform(
        &self,
        target: &FrameId,
        source: &FrameId,
        time: LookupTime,
    ) -> Result<StampedTransform, TransformError> {
        resolve(&self.read(), target, source, time)
    }
}

fn validate(tf: &StampedTransform) -> Result<(), TransformError> {
    if tf.parent.is_empty() || tf.child.is_empty() {
        return Err(TransformError::invalid(
            tf.parent.clone(),
            tf.child.clone(),
            "frame id must not be empty",
        ));
    }
    if tf.parent == tf.child {
        return Err(TransformError::invalid(
            tf.parent.clone(),
            tf.child.clone(),
            "frame cannot be its own parent",
        ));
    }
    if !tf.transform.is_valid() {
        return Err(TransformError::invalid(
            tf.parent.clone(),
            tf.child.clone(),
            "non-finite value or degenerate rotation",
        ));
    }
    Ok(())
}

fn is_known(frames: &FrameMap, frame: &str) -> bool {
    frames.contains_key(frame) || frames.values().any(|h| h.parent() == frame)
}

/// `[start, parent, grandparent, ..., root]`
fn chain_to_root(frames: &FrameMap, start: &FrameId) -> Result<Vec<FrameId>, TransformError> {
    let mut chain = vec![start.clone()];
    let mut current = start;

    while let Some(history) = frames.get(current) {
        if chain.len() > MAX_GRAPH_DEPTH {
            return Err(TransformError::LoopDetected(start.clone()));
        }
        current = history.parent();
        chain.push(current.clone());
    }
    Ok(chain)
}

fn resolve(
    frames: &FrameMap,
    target: &FrameId,
    source: &FrameId,
    time: LookupTime,
) -> Result<StampedTransform, TransformError> {
    for frame in [target, source] {
        if !is_known(frames, frame) {
            return Err(TransformError::UnknownFrame(frame.clone()));
        }
    }

    if target == source {
        return Ok(StampedTransform {
            stamp: time.timestamp().unwrap_or(Timestamp::ZERO),
            parent: target.clone(),
            child: source.clone(),
            transform: contracts::Transform::identity(),
        });
    }

    let source_chain = chain_to_root(frames, source)?;
    let target_chain = chain_to_root(frames, target)?;

    // Closest common ancestor: first frame of the source chain the target
    // chain also passes through
    let Some((source_depth, target_depth)) = source_chain
        .iter()
        .enumerate()
        .find_map(|(i, f)| target_chain.iter().position(|t| t == f).map(|j| (i, j)))
    else {
        return Err(TransformError::Disconnected {
            target_frame: target.clone(),
            source_frame: source.clone(),
        });
    };

    let source_edges = &source_chain[..source_depth];
    let target_edges = &target_chain[..target_depth];

    let stamp = match time {
        LookupTime::At(t) => t,
        LookupTime::Latest => latest_common_time(frames, source_edges.iter().chain(target_edges))?,
    };

    let ancestor_source = compose(frames, source_edges, stamp)?;
    let ancestor_target = compose(frames, target_edges, stamp)?;
    let target_source = ancestor_target.inverse() * ancestor_source;

    Ok(StampedTransform {
        stamp,
        parent: target.clone(),
        child: source.clone(),
        transform: from_isometry(&target_source),
    })
}

/// Newest time at which every dynamic edge has data: the minimum of the
/// edges' newest stamps. All-static chains resolve to `Timestamp::ZERO`.
fn latest_common_time<'a>(
    frames: &FrameMap,
    edges: impl Iterator<Item = &'a FrameId>,
) -> Result<Timestamp, TransformError> {
    let mut common: Option<Timestamp> = None;
    for frame in edges {
        let Some(history) = frames.get(frame) else {
            continue;
        };
        if history.is_static() {
            continue;
        }
        let newest = history
            .newest_stamp()
            .ok_or_else(|| TransformError::NoData(frame.clone()))?;
        common = min_opt(common, Some(newest));
    }
    Ok(common.unwrap_or(Timestamp::ZERO))
}

/// Pose of `edges[0]` in the parent of the last edge
fn compose(
    frames: &FrameMap,
    edges: &[FrameId],
    stamp: Timestamp,
) -> Result<Isometry3<f64>, TransformError> {
    let mut acc = Isometry3::identity();
    for frame in edges.iter().rev() {
        let history = frames
            .get(frame)
            .ok_or_else(|| TransformError::UnknownFrame(frame.clone()))?;
        acc *= history.sample_at(stamp)?;
    }
    Ok(acc)
}

fn min_opt(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    a.max(b)
}
