//! ProbeBlueprint - Config Loader output
//!
//! Describes a probe session: lookup tuning, buffer retention, the frames to
//! publish (static and simulated), and the lookups to run against them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{BufferConfig, FrameId, LookupConfig, LookupTime, Timestamp, Transform};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Lookup tuning
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Buffer retention
    #[serde(default)]
    pub buffer: BufferConfig,

    /// Transforms published once, valid at all times
    #[serde(default)]
    pub static_transforms: Vec<StaticTransformConfig>,

    /// Simulated periodic publishers
    #[serde(default)]
    pub broadcasters: Vec<BroadcasterConfig>,

    /// Lookups to run
    pub queries: Vec<QueryConfig>,
}

/// Fixed transform between two frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticTransformConfig {
    pub parent: FrameId,
    pub child: FrameId,

    /// Translation (x, y, z) in metres
    #[serde(default)]
    pub translation: [f64; 3],

    /// Roll, pitch, yaw in radians
    #[serde(default)]
    pub rpy: [f64; 3],
}

impl StaticTransformConfig {
    pub fn transform(&self) -> Transform {
        Transform::from_translation_rpy(self.translation, self.rpy)
    }
}

/// Simulated publisher moving `child` relative to `parent` at constant velocity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcasterConfig {
    pub parent: FrameId,
    pub child: FrameId,

    /// Publish rate (Hz), must be > 0
    pub frequency_hz: f64,

    /// Delay before the first message, simulating delivery latency
    #[serde(default)]
    pub start_delay_ms: u64,

    /// Stop publishing after this long (None = until shutdown)
    #[serde(default)]
    pub stop_after_ms: Option<u64>,

    /// Initial translation (x, y, z) in metres
    #[serde(default)]
    pub translation: [f64; 3],

    /// Roll, pitch, yaw in radians
    #[serde(default)]
    pub rpy: [f64; 3],

    /// Linear velocity (m/s) applied to the translation
    #[serde(default)]
    pub velocity: [f64; 3],
}

impl BroadcasterConfig {
    /// Highest rate whose period is still at least one nanosecond
    pub const MAX_FREQUENCY_HZ: f64 = 1e9;

    /// Publish period, one second for a non-positive rate, never zero.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frequency_hz)
            .unwrap_or(Duration::from_secs(1))
            .max(Duration::from_nanos(1))
    }

    /// Pose after `elapsed` of motion.
    pub fn transform_at(&self, elapsed: Duration) -> Transform {
        let dt = elapsed.as_secs_f64();
        let translation = [
            self.translation[0] + self.velocity[0] * dt,
            self.translation[1] + self.velocity[1] * dt,
            self.translation[2] + self.velocity[2] * dt,
        ];
        Transform::from_translation_rpy(translation, self.rpy)
    }
}

/// A lookup to run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub target: FrameId,
    pub source: FrameId,

    #[serde(default)]
    pub time: QueryTime,

    /// Per-query timeout, falls back to `lookup.default_timeout_ms`
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Query time, relative to the probe start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTime {
    /// Latest available
    #[default]
    Latest,
    /// The probe start instant
    Start,
    /// Probe start shifted by the given milliseconds
    OffsetMs(i64),
}

impl QueryTime {
    pub fn resolve(&self, probe_start: Timestamp) -> LookupTime {
        match *self {
            QueryTime::Latest => LookupTime::Latest,
            QueryTime::Start => LookupTime::At(probe_start),
            QueryTime::OffsetMs(ms) if ms >= 0 => {
                LookupTime::At(probe_start + Duration::from_millis(ms.unsigned_abs()))
            }
            QueryTime::OffsetMs(ms) => {
                LookupTime::At(probe_start - Duration::from_millis(ms.unsigned_abs()))
            }
        }
    }
}
