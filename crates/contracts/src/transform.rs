//! Transform data carried between the delivery layer, the store and callers.
//!
//! These are plain data; composition and interpolation live in the store.

use serde::{Deserialize, Serialize};

use crate::{FrameId, Timestamp};

/// Rigid transform: translation in metres plus a unit rotation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation [x, y, z]
    pub translation: [f64; 3],
    /// Rotation quaternion [x, y, z, w]
    pub rotation: [f64; 4],
}

impl Transform {
    /// Identity transform
    pub const fn identity() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Pure translation
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: [x, y, z],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Build from translation and roll/pitch/yaw (radians, fixed XYZ axes).
    pub fn from_translation_rpy(translation: [f64; 3], rpy: [f64; 3]) -> Self {
        let (sr, cr) = (rpy[0] * 0.5).sin_cos();
        let (sp, cp) = (rpy[1] * 0.5).sin_cos();
        let (sy, cy) = (rpy[2] * 0.5).sin_cos();

        Self {
            translation,
            rotation: [
                sr * cp * cy - cr * sp * sy,
                cr * sp * cy + sr * cp * sy,
                cr * cp * sy - sr * sp * cy,
                cr * cp * cy + sr * sp * sy,
            ],
        }
    }

    /// All components finite and the quaternion not degenerate.
    pub fn is_valid(&self) -> bool {
        let finite = self
            .translation
            .iter()
            .chain(self.rotation.iter())
            .all(|v| v.is_finite());
        let norm_sq: f64 = self.rotation.iter().map(|v| v * v).sum();
        finite && norm_sq > f64::EPSILON
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform valid at `stamp`: the pose of `child` expressed in `parent`.
///
/// A lookup for `(target, source)` yields `parent = target` and
/// `child = source`, i.e. the transform that maps points expressed in the
/// source frame into the target frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedTransform {
    /// Time the transform is valid at
    pub stamp: Timestamp,
    /// Frame the pose is expressed in
    pub parent: FrameId,
    /// Frame whose pose this is
    pub child: FrameId,
    /// The transform itself
    pub transform: Transform,
}

impl StampedTransform {
    pub fn new(
        stamp: Timestamp,
        parent: impl Into<FrameId>,
        child: impl Into<FrameId>,
        transform: Transform,
    ) -> Self {
        Self {
            stamp,
            parent: parent.into(),
            child: child.into(),
            transform,
        }
    }
}
