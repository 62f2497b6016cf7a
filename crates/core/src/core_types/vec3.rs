//! Vector and matrix type aliases for grid positions, velocities and camera math.

use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type for positions, velocities, and directions.
///
/// This is a simple alias for `nalgebra::Vector3<f32>`, used throughout
/// the simulation for grid positions, velocity cells and ray directions.
pub type Vec3 = Vector3<f32>;

/// 4-component vector, used for linear RGBA pixels and homogeneous coordinates.
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix for view, projection and model transforms.
pub type Mat4 = Matrix4<f32>;
