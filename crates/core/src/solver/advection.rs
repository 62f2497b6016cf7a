//! Semi-Lagrangian advection
//!
//! Each cell traces backward along the current velocity by one timestep and
//! resamples the source field there. Velocity advects itself and picks up
//! buoyancy from the temperature at the departure point; density and
//! temperature are carried by the velocity produced by that pass.

use crate::core_types::Vec3;
use crate::grid::{
    boundary_value, cell_position, par_for_each_cell, sample_trilinear, BoundaryMode, GridField,
};

/// Parameters for velocity self-advection
#[derive(Debug, Clone, Copy)]
pub struct VelocityAdvectParams {
    /// Timestep in seconds
    pub dt: f32,
    /// Upward acceleration per unit temperature
    pub buoyancy: f32,
    /// Multiplier applied to the advected velocity
    pub decay: f32,
}

/// Advect velocity through itself and add buoyancy
///
/// `v' = (sample(v, p - v·dt) + buoyancy · T(p - v·dt) · ŷ) · decay`, followed
/// by a clamped (zero) boundary and a swap.
///
/// # Arguments
///
/// * `velocity` - Velocity field, advected in place through its ping-pong buffers
/// * `temperature` - Current temperature buffer
/// * `params` - Timestep, buoyancy and decay
pub fn advect_velocity_cpu(
    velocity: &mut GridField<Vec3>,
    temperature: &[f32],
    params: VelocityAdvectParams,
) {
    let grid = velocity.grid();
    let up = Vec3::y();
    let (read, write) = velocity.read_write();

    par_for_each_cell(grid, write, |x, y, z, idx| {
        if let Some(edge) = boundary_value(BoundaryMode::Clamped, grid, x, y, z, read) {
            return edge;
        }
        let departure = cell_position(x, y, z) - read[idx] * params.dt;
        let carried = sample_trilinear(read, grid, departure);
        let heat = sample_trilinear(temperature, grid, departure);
        (carried + up * (params.buoyancy * heat)) * params.decay
    });

    velocity.swap();
}

/// Advect a scalar field through a velocity field
///
/// The result is scaled by `decay`, faces mirror their interior neighbour,
/// and every value is clamped to `[0, 1]` before the swap.
///
/// # Arguments
///
/// * `field` - Density or temperature
/// * `velocity` - Current velocity buffer
/// * `dt` - Timestep in seconds
/// * `decay` - Multiplier applied to the advected value
pub fn advect_scalar_cpu(field: &mut GridField<f32>, velocity: &[Vec3], dt: f32, decay: f32) {
    let grid = field.grid();
    let (read, write) = field.read_write();

    par_for_each_cell(grid, write, |x, y, z, idx| {
        let value = boundary_value(BoundaryMode::Mirror, grid, x, y, z, read).unwrap_or_else(|| {
            let departure = cell_position(x, y, z) - velocity[idx] * dt;
            sample_trilinear(read, grid, departure) * decay
        });
        value.clamp(0.0, 1.0)
    });

    field.swap();
}
