//! Smoke solver trait definition
//!
//! This module defines the `SmokeSolver` trait, a backend-agnostic interface
//! for running solver kernels over the simulation grid. Both the CPU and GPU
//! backends implement it.

use super::config::SolverConfig;
use super::kernel::Kernel;
use crate::core_types::Vec3;
use crate::error::Result;
use crate::grid::FieldKind;
use std::borrow::Cow;

/// Per-frame uniforms passed to every dispatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    /// Timestep in seconds
    pub dt: f32,
    /// Validated solver configuration
    pub config: SolverConfig,
}

/// Backend-agnostic interface for the smoke solver
///
/// A dispatch runs one pass over the whole grid and returns only once every
/// cell has been written and the target buffers swapped, so consecutive
/// dispatches are separated by a full barrier.
pub trait SmokeSolver: Send + Sync {
    /// Run one kernel pass
    ///
    /// # Arguments
    ///
    /// * `kernel` - Pass to run
    /// * `params` - Timestep and configuration for this frame
    fn dispatch(&mut self, kernel: &Kernel, params: &FrameParams);

    /// Read a scalar field's current buffer
    ///
    /// # Returns
    ///
    /// `None` for [`FieldKind::Velocity`]. CPU backend returns a borrowed slice,
    /// GPU backend returns an owned Vec.
    fn read_scalar(&self, kind: FieldKind) -> Option<Cow<'_, [f32]>>;

    /// Read the current velocity buffer
    fn read_velocity(&self) -> Cow<'_, [Vec3]>;

    /// Reallocate every field for a new grid size
    ///
    /// On failure the solver keeps its previous grid and contents.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SmokeError::Allocation`] if the new fields cannot be allocated.
    fn resize(&mut self, grid_size: usize) -> Result<()>;

    /// Zero every field, keeping the grid size
    fn reset(&mut self);

    /// Restart the impulse tie-break sequence from `seed`
    fn reseed(&mut self, seed: u64);

    /// Grid side length
    fn grid_size(&self) -> usize;

    /// Check if this is the GPU backend
    ///
    /// # Returns
    ///
    /// `true` if GPU-accelerated, `false` if CPU-only
    fn is_gpu_accelerated(&self) -> bool;
}
