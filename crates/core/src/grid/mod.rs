//! Grid storage, boundary handling, and sampling
//!
//! All fields share one cubic lattice of side `n`. The helpers here are the
//! building blocks every solver kernel is written with.

pub mod boundary;
pub mod field;
pub mod sampling;

pub use boundary::{boundary_value, BoundaryMode};
pub use field::{CellValue, FieldKind, FieldSet, GridField};
pub use sampling::{cell_position, sample_trilinear, Neighbours};

use crate::core_types::GridIndex;
use rayon::prelude::*;

/// Compute every cell of `out` in parallel
///
/// The closure receives `(x, y, z, idx)` and returns the new value for that
/// cell. Work is split into z-planes; each worker owns the cells it writes.
pub fn par_for_each_cell<T, F>(grid: GridIndex, out: &mut [T], kernel: F)
where
    T: CellValue,
    F: Fn(usize, usize, usize, usize) -> T + Sync,
{
    let n = grid.size();
    let plane = n * n;
    out.par_chunks_mut(plane)
        .enumerate()
        .for_each(|(z, cells)| {
            for (local, cell) in cells.iter_mut().enumerate() {
                let x = local % n;
                let y = local / n;
                *cell = kernel(x, y, z, z * plane + local);
            }
        });
}

/// Update every cell of `data` in place, in parallel
///
/// The closure receives `(x, y, z, &mut value)`.
pub fn par_update_cells<T, F>(grid: GridIndex, data: &mut [T], update: F)
where
    T: CellValue,
    F: Fn(usize, usize, usize, &mut T) + Sync,
{
    let n = grid.size();
    data.par_chunks_mut(n * n)
        .enumerate()
        .for_each(|(z, cells)| {
            for (local, cell) in cells.iter_mut().enumerate() {
                update(local % n, local / n, z, cell);
            }
        });
}
