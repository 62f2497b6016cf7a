//! CPU-based smoke solver implementation
//!
//! This module provides a CPU implementation of the `SmokeSolver` trait using
//! `Vec` buffers and Rayon for parallelism. This backend is always available
//! and serves as a fallback when GPU acceleration is not available.

use super::advection::{advect_scalar_cpu, advect_velocity_cpu, VelocityAdvectParams};
use super::config::SolverConfig;
use super::diffusion::{diffuse_cpu, diffusion_alpha};
use super::impulse::apply_impulse_cpu;
use super::kernel::{Kernel, ScalarField};
use super::profiler::ProfilerScope;
use super::projection::{
    compute_divergence_cpu, pressure_boundary_cpu, pressure_jacobi_cpu, subtract_gradient_cpu,
};
use super::{FrameParams, SmokeSolver};
use crate::core_types::Vec3;
use crate::error::Result;
use crate::grid::{FieldKind, FieldSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::borrow::Cow;
use tracing::{info, warn};

/// CPU-based smoke solver using Rayon for parallelism
///
/// Each field is a double buffer; a dispatch reads the current buffer, writes
/// the other one in parallel, and swaps once all workers have joined.
pub struct CpuSmokeSolver {
    fields: FieldSet,
    // Refinement copy for the red/black diffusion half-sweeps
    scratch: Vec<f32>,
    rng: StdRng,
}

impl CpuSmokeSolver {
    /// Create a new CPU solver for a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::SmokeError::Allocation`] if the fields cannot be allocated.
    pub fn new(config: &SolverConfig) -> Result<Self> {
        let fields = FieldSet::try_new(config.grid_size)?;
        info!(
            grid_size = config.grid_size,
            bytes = FieldSet::bytes_for(config.grid_size),
            "CPU smoke solver allocated"
        );
        Ok(Self {
            fields,
            scratch: Vec::new(),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Borrow every field
    #[must_use]
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Mutably borrow every field
    ///
    /// Intended for seeding initial conditions; writes go to the current buffers.
    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }
}

impl SmokeSolver for CpuSmokeSolver {
    fn dispatch(&mut self, kernel: &Kernel, params: &FrameParams) {
        let _scope = ProfilerScope::new(kernel.label());
        let config = &params.config;
        let dt = params.dt;
        let n = self.fields.size();

        match kernel {
            Kernel::Impulse(impulse) => {
                apply_impulse_cpu(&mut self.fields, impulse, config, &mut self.rng);
            }
            Kernel::Diffuse => {
                let iterations = config.diffusion_iterations;
                let alpha = diffusion_alpha(config.viscosity, dt, n);
                diffuse_cpu(&mut self.fields.density, &mut self.scratch, alpha, iterations);
                let alpha = diffusion_alpha(config.temperature_viscosity, dt, n);
                diffuse_cpu(&mut self.fields.temperature, &mut self.scratch, alpha, iterations);
            }
            Kernel::AdvectVelocity => {
                let params = VelocityAdvectParams {
                    dt,
                    buoyancy: config.buoyancy,
                    decay: config.velocity_decay,
                };
                advect_velocity_cpu(&mut self.fields.velocity, self.fields.temperature.read(), params);
            }
            Kernel::AdvectScalar(ScalarField::Density) => {
                let velocity = self.fields.velocity.read();
                advect_scalar_cpu(&mut self.fields.density, velocity, dt, config.density_decay);
            }
            Kernel::AdvectScalar(ScalarField::Temperature) => {
                let velocity = self.fields.velocity.read();
                advect_scalar_cpu(&mut self.fields.temperature, velocity, dt, config.temperature_decay);
            }
            Kernel::Divergence => {
                compute_divergence_cpu(&mut self.fields.divergence, self.fields.velocity.read());
            }
            Kernel::PressureJacobi => {
                pressure_jacobi_cpu(&mut self.fields.pressure, self.fields.divergence.read());
            }
            Kernel::GradientSubtract => {
                subtract_gradient_cpu(&mut self.fields.velocity, self.fields.pressure.read());
            }
            Kernel::PressureBoundary => {
                pressure_boundary_cpu(&mut self.fields.pressure);
            }
        }
    }

    fn read_scalar(&self, kind: FieldKind) -> Option<Cow<'_, [f32]>> {
        self.fields.scalar(kind).map(|field| Cow::Borrowed(field.read()))
    }

    fn read_velocity(&self) -> Cow<'_, [Vec3]> {
        Cow::Borrowed(self.fields.velocity.read())
    }

    fn resize(&mut self, grid_size: usize) -> Result<()> {
        match FieldSet::try_new(grid_size) {
            Ok(fields) => {
                info!(from = self.fields.size(), to = grid_size, "CPU smoke solver resized");
                self.fields = fields;
                Ok(())
            }
            Err(err) => {
                warn!(grid_size, error = %err, "resize failed, keeping previous grid");
                Err(err)
            }
        }
    }

    fn reset(&mut self) {
        self.fields.velocity.fill(Vec3::zeros());
        for kind in FieldKind::SCALARS {
            if let Some(field) = self.fields.scalar_mut(kind) {
                field.fill(0.0);
            }
        }
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn grid_size(&self) -> usize {
        self.fields.size()
    }

    fn is_gpu_accelerated(&self) -> bool {
        false
    }
}
