//! Solver configuration
//!
//! Every kernel receives the configuration explicitly through
//! [`FrameParams`](super::FrameParams); nothing is read from globals.
//! Values are validated once at the simulation boundary and never re-checked
//! inside a pass.

use crate::error::{Result, SmokeError};
use serde::{Deserialize, Serialize};

/// Smallest supported grid side
pub const MIN_GRID_SIZE: usize = 4;
/// Largest supported grid side
pub const MAX_GRID_SIZE: usize = 256;

/// Parameters shared read-only by all solver kernels in a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Grid side length `N` (cells per axis)
    pub grid_size: usize,
    /// Density diffusion coefficient
    pub viscosity: f32,
    /// Temperature diffusion coefficient
    pub temperature_viscosity: f32,
    /// Velocity multiplier applied after self-advection
    pub velocity_decay: f32,
    /// Density multiplier applied after advection
    pub density_decay: f32,
    /// Temperature multiplier applied after advection
    pub temperature_decay: f32,
    /// Upward acceleration per unit temperature
    pub buoyancy: f32,
    /// Diffusion relaxation rounds (`K`)
    pub diffusion_iterations: u32,
    /// Pressure Jacobi iterations (`M`)
    pub pressure_iterations: u32,
    /// Injector density gain
    pub density_factor: f32,
    /// Injector temperature gain
    pub temperature_factor: f32,
    /// Injector pressure gain
    pub pressure_factor: f32,
    /// Seed for the injector's tie-break direction
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            grid_size: 32,
            viscosity: 1.0,
            temperature_viscosity: 1.0,
            velocity_decay: 0.999,
            density_decay: 0.995,
            temperature_decay: 0.98,
            buoyancy: 0.5,
            diffusion_iterations: 20,
            pressure_iterations: 40,
            density_factor: 0.3,
            temperature_factor: 0.3,
            pressure_factor: 0.5,
            seed: 42,
        }
    }
}

impl SolverConfig {
    /// Check every parameter against its valid range
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(SmokeError::invalid_config(
                "grid_size",
                format!(
                    "must be in [{MIN_GRID_SIZE}, {MAX_GRID_SIZE}], got {}",
                    self.grid_size
                ),
            ));
        }

        for (field, value) in [
            ("viscosity", self.viscosity),
            ("temperature_viscosity", self.temperature_viscosity),
            ("buoyancy", self.buoyancy),
            ("density_factor", self.density_factor),
            ("temperature_factor", self.temperature_factor),
            ("pressure_factor", self.pressure_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SmokeError::invalid_config(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }

        for (field, value) in [
            ("velocity_decay", self.velocity_decay),
            ("density_decay", self.density_decay),
            ("temperature_decay", self.temperature_decay),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SmokeError::invalid_config(
                    field,
                    format!("must be in [0, 1], got {value}"),
                ));
            }
        }

        if self.diffusion_iterations == 0 {
            return Err(SmokeError::invalid_config(
                "diffusion_iterations",
                "must be at least 1",
            ));
        }
        if self.pressure_iterations == 0 {
            return Err(SmokeError::invalid_config(
                "pressure_iterations",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Same configuration with a different grid size
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_grid_size_bounds() {
        let small = SolverConfig::default().with_grid_size(2);
        assert!(matches!(
            small.validate(),
            Err(SmokeError::InvalidConfig { field: "grid_size", .. })
        ));
        let large = SolverConfig::default().with_grid_size(MAX_GRID_SIZE + 1);
        assert!(large.validate().is_err());
        assert!(SolverConfig::default().with_grid_size(MIN_GRID_SIZE).validate().is_ok());
    }

    #[test]
    fn test_rejects_non_finite_and_negative() {
        let config = SolverConfig {
            viscosity: f32::NAN,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SolverConfig {
            buoyancy: -1.0,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SmokeError::InvalidConfig { field: "buoyancy", .. })
        ));
    }

    #[test]
    fn test_rejects_decay_out_of_range() {
        let config = SolverConfig {
            density_decay: 1.5,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = SolverConfig {
            pressure_iterations: 0,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SmokeError::InvalidConfig { field: "pressure_iterations", .. })
        ));
    }
}
