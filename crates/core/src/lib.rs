//! Smoke Simulation Core Library
//!
//! A grid-based smoke and fire solver with a volumetric renderer. The solver
//! advances velocity, density, temperature and pressure on a cubic lattice
//! using semi-Lagrangian advection, implicit diffusion and a Jacobi pressure
//! projection. The renderer ray marches the result with single scattering
//! from a point light.
//!
//! ## Structure
//!
//! - [`grid`]: double-buffered fields, boundary policy and trilinear sampling
//! - [`solver`]: the kernel set, the per-frame pipeline and the CPU/GPU backends
//! - [`render`]: camera rays, sampling textures and the ray marcher
//! - [`simulation`]: [`SmokeSimulation`], which ties the pieces together
//!
//! ## Example
//!
//! ```rust,ignore
//! use smoke_sim_core::{RenderConfig, SmokeSimulation, SolverConfig, Vec3};
//!
//! let mut sim = SmokeSimulation::new(SolverConfig::default(), RenderConfig::default(), 640, 480)?;
//! sim.inject_impulse(Vec3::new(16.0, 4.0, 16.0), 4.0, 2.0)?;
//! let report = sim.advance(1.0 / 60.0)?;
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Simulation modules
pub mod grid;
pub mod render;
pub mod simulation;
pub mod solver;

// Re-export core types
pub use core_types::{GridIndex, Mat4, Vec3, Vec4};
pub use error::{Result, SmokeError};

// Re-export the main API
pub use grid::{BoundaryMode, FieldKind, FieldSet, GridField};
pub use render::{CameraPose, ColorBuffer, RenderConfig, RenderMode, VolumeTransform};
pub use simulation::{FrameReport, RunState, SmokeSimulation};
pub use solver::{
    create_smoke_solver, CpuSmokeSolver, Impulse, Kernel, Pipeline, QualityPreset, SmokeSolver,
    SolverConfig,
};
