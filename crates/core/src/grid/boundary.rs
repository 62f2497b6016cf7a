//! Boundary policy for the six faces of the simulation cube
//!
//! Kernels call [`boundary_value`] for the cell they own. Interior cells get
//! `None` and keep the value the kernel computed; face cells get the
//! replacement value dictated by the [`BoundaryMode`].

use super::field::CellValue;
use crate::core_types::GridIndex;

/// How face cells are treated after a kernel pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryMode {
    /// Copy the value of the adjacent interior cell from the read buffer
    #[default]
    Mirror,
    /// Overwrite face cells with the field's zero value
    Clamped,
}

/// Replacement value for a face cell, or `None` for interior cells
///
/// Face membership is resolved in a fixed order: left (`x = 0`), right
/// (`x = n-1`), top (`y = n-1`), bottom (`y = 0`), front (`z = n-1`),
/// back (`z = 0`). The first matching face wins, so edge and corner cells
/// mirror along a single axis only.
///
/// # Arguments
///
/// * `mode` - Boundary policy
/// * `grid` - Grid indexing helper
/// * `x`, `y`, `z` - Cell coordinates
/// * `read` - Read buffer of the field being written
#[inline]
#[must_use]
pub fn boundary_value<T: CellValue>(
    mode: BoundaryMode,
    grid: GridIndex,
    x: usize,
    y: usize,
    z: usize,
    read: &[T],
) -> Option<T> {
    let last = grid.size() - 1;
    if !grid.is_boundary(x, y, z) {
        return None;
    }

    match mode {
        BoundaryMode::Clamped => Some(T::zero()),
        BoundaryMode::Mirror => {
            let source = if x == 0 {
                grid.offset_clamped(x, y, z, 1, 0, 0)
            } else if x == last {
                grid.offset_clamped(x, y, z, -1, 0, 0)
            } else if y == last {
                grid.offset_clamped(x, y, z, 0, -1, 0)
            } else if y == 0 {
                grid.offset_clamped(x, y, z, 0, 1, 0)
            } else if z == last {
                grid.offset_clamped(x, y, z, 0, 0, -1)
            } else {
                grid.offset_clamped(x, y, z, 0, 0, 1)
            };
            Some(read[source])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Vec3;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n * n * n).map(|i| i as f32).collect()
    }

    #[test]
    fn test_interior_cells_untouched() {
        let grid = GridIndex::new(5);
        let read = ramp(5);
        assert_eq!(boundary_value(BoundaryMode::Mirror, grid, 2, 2, 2, &read), None);
        assert_eq!(boundary_value(BoundaryMode::Clamped, grid, 1, 3, 2, &read), None);
    }

    #[test]
    fn test_mirror_copies_interior_neighbour() {
        let grid = GridIndex::new(5);
        let read = ramp(5);

        let left = boundary_value(BoundaryMode::Mirror, grid, 0, 2, 2, &read);
        assert_eq!(left, Some(read[grid.index(1, 2, 2)]));

        let right = boundary_value(BoundaryMode::Mirror, grid, 4, 2, 2, &read);
        assert_eq!(right, Some(read[grid.index(3, 2, 2)]));

        let top = boundary_value(BoundaryMode::Mirror, grid, 2, 4, 2, &read);
        assert_eq!(top, Some(read[grid.index(2, 3, 2)]));

        let back = boundary_value(BoundaryMode::Mirror, grid, 2, 2, 0, &read);
        assert_eq!(back, Some(read[grid.index(2, 2, 1)]));
    }

    #[test]
    fn test_corner_uses_first_matching_face() {
        let grid = GridIndex::new(4);
        let read = ramp(4);
        // (0, 0, 0) hits the left face first and mirrors along x only
        let corner = boundary_value(BoundaryMode::Mirror, grid, 0, 0, 0, &read);
        assert_eq!(corner, Some(read[grid.index(1, 0, 0)]));
    }

    #[test]
    fn test_clamped_zeroes_vectors() {
        let grid = GridIndex::new(4);
        let read = vec![Vec3::new(1.0, 2.0, 3.0); 64];
        let value = boundary_value(BoundaryMode::Clamped, grid, 3, 1, 1, &read);
        assert_eq!(value, Some(Vec3::zeros()));
    }
}
