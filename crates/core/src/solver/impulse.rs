//! Impulse injection
//!
//! An impulse pushes smoke outward from a point and deposits density,
//! temperature and pressure with a linear falloff. It is the only kernel that
//! updates the current buffers in place: each cell's update depends on that
//! cell alone and is purely additive.

use super::config::SolverConfig;
use crate::core_types::{GridIndex, Vec3};
use crate::error::{Result, SmokeError};
use crate::grid::{cell_position, par_update_cells, FieldSet};
use rand::rngs::StdRng;
use rand::Rng;
use std::f32::consts::TAU;

/// Density and temperature deposited at the impulse centre per unit factor
pub const INJECTION_GAIN: f32 = 3.0;

/// A single radial injection in grid space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    /// Centre in cell units
    pub position: Vec3,
    /// Radius in cells
    pub radius: f32,
    /// Peak outward velocity added at the centre
    pub strength: f32,
}

impl Impulse {
    /// Create a validated impulse
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidImpulse`] if the position or strength is not
    /// finite, or if the radius is not strictly positive.
    pub fn new(position: Vec3, radius: f32, strength: f32) -> Result<Self> {
        let impulse = Self {
            position,
            radius,
            strength,
        };
        impulse.validate()?;
        Ok(impulse)
    }

    /// Check the impulse parameters
    ///
    /// # Errors
    ///
    /// See [`Impulse::new`].
    pub fn validate(&self) -> Result<()> {
        if !self.position.iter().all(|c| c.is_finite()) {
            return Err(SmokeError::invalid_impulse(format!(
                "position must be finite, got {:?}",
                self.position
            )));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SmokeError::invalid_impulse(format!(
                "radius must be finite and positive, got {}",
                self.radius
            )));
        }
        if !self.strength.is_finite() {
            return Err(SmokeError::invalid_impulse(format!(
                "strength must be finite, got {}",
                self.strength
            )));
        }
        Ok(())
    }

    /// Linear falloff `1 - d/r` for a cell, or `None` when the cell is outside the radius
    #[inline]
    #[must_use]
    pub fn falloff(&self, cell: Vec3) -> Option<f32> {
        let distance = (cell - self.position).norm();
        (distance < self.radius).then(|| 1.0 - distance / self.radius)
    }
}

/// Uniformly distributed direction on the unit sphere
pub fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let phi: f32 = rng.random_range(0.0..TAU);
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * phi.cos(), ring * phi.sin(), z)
}

/// Apply an impulse to every field's current buffer
///
/// Boundary cells and cells at distance `>= radius` are left untouched.
/// A cell exactly at the centre has no outward direction, so it receives a
/// random unit direction drawn from `rng`.
///
/// # Arguments
///
/// * `fields` - Field set to modify in place
/// * `impulse` - Validated impulse
/// * `config` - Injector gains
/// * `rng` - Source for the centre tie-break direction
pub fn apply_impulse_cpu(
    fields: &mut FieldSet,
    impulse: &Impulse,
    config: &SolverConfig,
    rng: &mut StdRng,
) {
    let grid = GridIndex::new(fields.size());
    let tie_break = random_unit_vector(rng);

    let cell_falloff = |x: usize, y: usize, z: usize| -> Option<(Vec3, f32)> {
        if grid.is_boundary(x, y, z) {
            return None;
        }
        let cell = cell_position(x, y, z);
        impulse.falloff(cell).map(|f| (cell - impulse.position, f))
    };

    par_update_cells(grid, fields.velocity.read_mut(), |x, y, z, v| {
        if let Some((offset, f)) = cell_falloff(x, y, z) {
            let direction = offset.try_normalize(f32::EPSILON).unwrap_or(tie_break);
            *v += direction * impulse.strength * f;
        }
    });

    let density_gain = INJECTION_GAIN * config.density_factor;
    par_update_cells(grid, fields.density.read_mut(), |x, y, z, d| {
        if let Some((_, f)) = cell_falloff(x, y, z) {
            *d = (*d + density_gain * f).clamp(0.0, 1.0);
        }
    });

    let temperature_gain = INJECTION_GAIN * config.temperature_factor;
    par_update_cells(grid, fields.temperature.read_mut(), |x, y, z, t| {
        if let Some((_, f)) = cell_falloff(x, y, z) {
            *t = (*t + temperature_gain * f).clamp(0.0, 1.0);
        }
    });

    let pressure_gain = config.pressure_factor;
    par_update_cells(grid, fields.pressure.read_mut(), |x, y, z, p| {
        if let Some((_, f)) = cell_falloff(x, y, z) {
            *p = (*p + pressure_gain * f).min(1.0);
        }
    });
}
