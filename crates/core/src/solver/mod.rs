//! Grid-based smoke solver module
//!
//! This module provides a unified GPU/CPU abstraction layer for the smoke
//! solver. The core abstraction is the `SmokeSolver` trait, which runs one
//! [`Kernel`] at a time over the whole grid.
//!
//! # Feature Flags
//!
//! - `gpu`: Enables GPU acceleration via wgpu. The CPU backend is always built.
//!
//! # Backend Selection
//!
//! [`create_smoke_solver`] picks the best available backend:
//! 1. Try GPU (if `gpu` feature enabled and hardware available)
//! 2. Fall back to CPU (always available)
//!
//! # Example
//!
//! ```rust,ignore
//! use smoke_sim_core::solver::{create_smoke_solver, FrameParams, Pipeline, SolverConfig};
//!
//! let config = SolverConfig::default();
//! let mut solver = create_smoke_solver(&config)?;
//! let frame = FrameParams { dt: 1.0 / 60.0, config };
//! for kernel in Pipeline::build(&config).kernels() {
//!     solver.dispatch(kernel, &frame);
//! }
//! ```

mod advection;
mod config;
mod context;
mod cpu;
mod diffusion;
mod impulse;
mod kernel;
pub mod profiler;
mod projection;
mod quality;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

#[cfg(feature = "gpu")]
mod gpu;

// Re-exports
pub use advection::{advect_scalar_cpu, advect_velocity_cpu, VelocityAdvectParams};
pub use config::{SolverConfig, MAX_GRID_SIZE, MIN_GRID_SIZE};
pub use context::GpuInitResult;
pub use cpu::CpuSmokeSolver;
pub use diffusion::{diffuse_cpu, diffusion_alpha};
pub use impulse::{apply_impulse_cpu, random_unit_vector, Impulse, INJECTION_GAIN};
pub use kernel::{Kernel, Pipeline, ScalarField, WORKGROUP_SIZE};
pub use profiler::{FrameTimer, PassStat, PassTimings, ProfilerScope};
pub use projection::{
    compute_divergence_cpu, divergence_at, mean_abs_divergence, pressure_boundary_cpu,
    pressure_jacobi_cpu, subtract_gradient_cpu,
};
pub use quality::QualityPreset;
pub use r#trait::{FrameParams, SmokeSolver};

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use gpu::GpuSmokeSolver;

use crate::error::Result;
use tracing::info;

#[cfg(feature = "gpu")]
use tracing::warn;

/// Create a smoke solver with automatic backend selection
///
/// Tries GPU acceleration first when the `gpu` feature is enabled, falling
/// back to the CPU backend otherwise.
///
/// # Arguments
///
/// * `config` - Validated solver configuration
///
/// # Errors
///
/// Returns [`crate::SmokeError::Allocation`] if the CPU fields cannot be allocated.
pub fn create_smoke_solver(config: &SolverConfig) -> Result<Box<dyn SmokeSolver>> {
    #[cfg(feature = "gpu")]
    {
        match GpuContext::acquire() {
            GpuInitResult::Success(gpu_context) => {
                let n = config.grid_size;
                if gpu_context.can_allocate(n) {
                    info!(
                        "Using GPU backend: {} ({}x{}x{} grid)",
                        gpu_context.adapter_name(),
                        n,
                        n,
                        n
                    );
                    return Ok(Box::new(GpuSmokeSolver::new(gpu_context, config)));
                }
                warn!(
                    "GPU has insufficient memory for {}^3 grid, falling back to CPU",
                    n
                );
            }
            GpuInitResult::NoGpuFound => {
                info!("No GPU found, using CPU backend");
            }
            GpuInitResult::InitFailed {
                adapter_name,
                error,
            } => {
                warn!(
                    "GPU '{}' found but failed to initialize: {}. Falling back to CPU.",
                    adapter_name, error
                );
            }
        }
    }

    #[cfg(not(feature = "gpu"))]
    info!("GPU feature disabled, using CPU backend");

    Ok(Box::new(CpuSmokeSolver::new(config)?))
}
