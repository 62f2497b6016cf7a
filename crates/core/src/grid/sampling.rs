//! Trilinear sampling and clamped neighbour stencils

use super::field::CellValue;
use crate::core_types::{GridIndex, Vec3};

/// Lattice position of a cell in cell units
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cell_position(x: usize, y: usize, z: usize) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32)
}

/// Sample a field at a fractional cell position
///
/// The position is clamped to `[0, n-1]` on every axis before the eight
/// surrounding cells are blended, so positions outside the grid read the
/// nearest face. At integer positions the stored value is returned exactly.
///
/// # Arguments
///
/// * `data` - Field buffer in `x + y·n + z·n²` order
/// * `grid` - Grid indexing helper
/// * `pos` - Position in cell units
#[must_use]
pub fn sample_trilinear<T: CellValue>(data: &[T], grid: GridIndex, pos: Vec3) -> T {
    #[allow(clippy::cast_precision_loss)]
    let max = (grid.size() - 1) as f32;
    let px = clamp_axis(pos.x, max);
    let py = clamp_axis(pos.y, max);
    let pz = clamp_axis(pos.z, max);

    let (x0, x1, fx) = axis_span(px, grid.size());
    let (y0, y1, fy) = axis_span(py, grid.size());
    let (z0, z1, fz) = axis_span(pz, grid.size());

    let at = |x: usize, y: usize, z: usize| data[grid.index(x, y, z)];

    let c00 = T::lerp(at(x0, y0, z0), at(x1, y0, z0), fx);
    let c10 = T::lerp(at(x0, y1, z0), at(x1, y1, z0), fx);
    let c01 = T::lerp(at(x0, y0, z1), at(x1, y0, z1), fx);
    let c11 = T::lerp(at(x0, y1, z1), at(x1, y1, z1), fx);

    let c0 = T::lerp(c00, c10, fy);
    let c1 = T::lerp(c01, c11, fy);
    T::lerp(c0, c1, fz)
}

#[inline]
fn clamp_axis(v: f32, max: f32) -> f32 {
    // NaN falls back to the low face
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, max)
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn axis_span(v: f32, n: usize) -> (usize, usize, f32) {
    let lo = (v.floor() as usize).min(n - 1);
    let hi = (lo + 1).min(n - 1);
    (lo, hi, v - lo as f32)
}

/// Linear indices of the six face neighbours of a cell, clamped to the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbours {
    /// `x - 1`
    pub left: usize,
    /// `x + 1`
    pub right: usize,
    /// `y - 1`
    pub down: usize,
    /// `y + 1`
    pub up: usize,
    /// `z - 1`
    pub back: usize,
    /// `z + 1`
    pub front: usize,
}

impl Neighbours {
    /// Neighbour indices of `(x, y, z)`
    #[inline]
    #[must_use]
    pub fn of(grid: GridIndex, x: usize, y: usize, z: usize) -> Self {
        Self {
            left: grid.offset_clamped(x, y, z, -1, 0, 0),
            right: grid.offset_clamped(x, y, z, 1, 0, 0),
            down: grid.offset_clamped(x, y, z, 0, -1, 0),
            up: grid.offset_clamped(x, y, z, 0, 1, 0),
            back: grid.offset_clamped(x, y, z, 0, 0, -1),
            front: grid.offset_clamped(x, y, z, 0, 0, 1),
        }
    }

    /// Sum of the six neighbour values
    #[inline]
    #[must_use]
    pub fn sum(&self, data: &[f32]) -> f32 {
        data[self.left]
            + data[self.right]
            + data[self.down]
            + data[self.up]
            + data[self.back]
            + data[self.front]
    }

    /// Central differences `(right - left, up - down, front - back)`
    #[inline]
    #[must_use]
    pub fn gradient(&self, data: &[f32]) -> Vec3 {
        Vec3::new(
            data[self.right] - data[self.left],
            data[self.up] - data[self.down],
            data[self.front] - data[self.back],
        )
    }
}
