//! Pressure projection
//!
//! Removes the divergent part of the velocity field in three stages:
//! divergence, Jacobi relaxation of `∇²p = div`, and subtraction of the
//! pressure gradient. Pressure is never cleared, so each frame's solve starts
//! from the previous frame's result.

use crate::core_types::{GridIndex, Vec3};
use crate::grid::{boundary_value, par_for_each_cell, BoundaryMode, GridField, Neighbours};
use rayon::prelude::*;

/// Divergence of a velocity buffer at one cell, with clamped neighbours
#[inline]
#[must_use]
pub fn divergence_at(velocity: &[Vec3], grid: GridIndex, x: usize, y: usize, z: usize) -> f32 {
    let nb = Neighbours::of(grid, x, y, z);
    0.5 * ((velocity[nb.right].x - velocity[nb.left].x)
        + (velocity[nb.up].y - velocity[nb.down].y)
        + (velocity[nb.front].z - velocity[nb.back].z))
}

/// Write the divergence of `velocity` into `divergence` and swap it in
///
/// Nothing from the divergence read buffer is used.
pub fn compute_divergence_cpu(divergence: &mut GridField<f32>, velocity: &[Vec3]) {
    let grid = divergence.grid();
    par_for_each_cell(grid, divergence.write_mut(), |x, y, z, _| {
        divergence_at(velocity, grid, x, y, z)
    });
    divergence.swap();
}

/// One Jacobi iteration of the pressure Poisson equation
///
/// `p' = (Σ6 p - div) / 6`, read buffer to write buffer, then swap.
pub fn pressure_jacobi_cpu(pressure: &mut GridField<f32>, divergence: &[f32]) {
    let grid = pressure.grid();
    let (read, write) = pressure.read_write();
    par_for_each_cell(grid, write, |x, y, z, idx| {
        (Neighbours::of(grid, x, y, z).sum(read) - divergence[idx]) / 6.0
    });
    pressure.swap();
}

/// Subtract half the central-difference pressure gradient from velocity
///
/// Faces are zeroed afterwards.
pub fn subtract_gradient_cpu(velocity: &mut GridField<Vec3>, pressure: &[f32]) {
    let grid = velocity.grid();
    let (read, write) = velocity.read_write();
    par_for_each_cell(grid, write, |x, y, z, idx| {
        boundary_value(BoundaryMode::Clamped, grid, x, y, z, read).unwrap_or_else(|| {
            read[idx] - Neighbours::of(grid, x, y, z).gradient(pressure) * 0.5
        })
    });
    velocity.swap();
}

/// Mirror pressure onto the faces so the next solve sees a zero normal gradient
pub fn pressure_boundary_cpu(pressure: &mut GridField<f32>) {
    let grid = pressure.grid();
    let (read, write) = pressure.read_write();
    par_for_each_cell(grid, write, |x, y, z, idx| {
        boundary_value(BoundaryMode::Mirror, grid, x, y, z, read).unwrap_or(read[idx])
    });
    pressure.swap();
}

/// Mean absolute divergence over the whole grid
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_abs_divergence(velocity: &[Vec3], grid: GridIndex) -> f32 {
    let count = grid.cell_count();
    if count == 0 {
        return 0.0;
    }
    let total: f32 = (0..count)
        .into_par_iter()
        .map(|idx| {
            let (x, y, z) = grid.coords(idx);
            divergence_at(velocity, grid, x, y, z).abs()
        })
        .sum();
    total / count as f32
}
