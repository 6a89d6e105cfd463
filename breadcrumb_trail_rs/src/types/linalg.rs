//! Linear algebra aliases for the trail estimator
//!
//! Everything lives in one stable world frame: x and z span the
//! horizontal plane, y is vertical and never estimated here.

use nalgebra::SVector;

// ===== Dimensions =====
pub const WORLD_DIM: usize = 3;

/// World-frame position or velocity.
pub type Vector3 = SVector<f64, WORLD_DIM>;

/// The zero vector every source reports before tracking starts.
pub fn origin() -> Vector3 {
    Vector3::zeros()
}

/// Narrow to `f32` for renderers that take single-precision positions.
pub fn to_f32_array(v: &Vector3) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}
