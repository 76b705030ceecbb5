//! Conversions between contract transforms and nalgebra isometries.

use contracts::Transform;
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};

const SLERP_EPSILON: f64 = 1.0e-9;

/// Normalizes the quaternion on the way in.
pub(crate) fn to_isometry(tf: &Transform) -> Isometry3<f64> {
    let [x, y, z] = tf.translation;
    let [qx, qy, qz, qw] = tf.rotation;
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));
    Isometry3::from_parts(Translation3::new(x, y, z), rotation)
}

pub(crate) fn from_isometry(iso: &Isometry3<f64>) -> Transform {
    let t = &iso.translation.vector;
    let q = iso.rotation.quaternion();
    Transform {
        translation: [t.x, t.y, t.z],
        rotation: [q.i, q.j, q.k, q.w],
    }
}

/// Linear translation, shortest-path slerp rotation. `ratio` in [0, 1].
pub(crate) fn interpolate(a: &Isometry3<f64>, b: &Isometry3<f64>, ratio: f64) -> Isometry3<f64> {
    let translation = a.translation.vector.lerp(&b.translation.vector, ratio);
    // try_slerp only gives up when both rotations are numerically identical
    let rotation = a
        .rotation
        .try_slerp(&b.rotation, ratio, SLERP_EPSILON)
        .unwrap_or(if ratio < 0.5 { a.rotation } else { b.rotation });
    Isometry3::from_parts(Translation3::from(translation), rotation)
}
