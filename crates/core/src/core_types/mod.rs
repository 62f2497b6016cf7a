//! Core types and utilities

pub mod grid_index;
pub mod vec3;

pub use grid_index::GridIndex;
pub use vec3::{Mat4, Vec3, Vec4};
