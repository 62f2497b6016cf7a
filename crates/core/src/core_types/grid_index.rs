//! Linear indexing for cubic lattices.
//!
//! Every field in the simulation is a cube of side `n` stored as a flat array
//! with `x` varying fastest: `idx = x + y·n + z·n²`.

/// Index helper for a cubic grid of side `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridIndex {
    n: usize,
}

impl GridIndex {
    /// Create an index helper for a grid of side `n`
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self { n }
    }

    /// Grid side length
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.n
    }

    /// Total number of cells (`n³`)
    #[inline]
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.n * self.n * self.n
    }

    /// Linear offset of `(x, y, z)`
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.n + z * self.n * self.n
    }

    /// Inverse of [`GridIndex::index`]
    #[inline]
    #[must_use]
    pub const fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let plane = self.n * self.n;
        (idx % self.n, (idx / self.n) % self.n, idx / plane)
    }

    /// Index of `(x, y, z)` displaced by `(dx, dy, dz)`, clamped to `[0, n-1]` per axis
    #[inline]
    #[must_use]
    pub fn offset_clamped(&self, x: usize, y: usize, z: usize, dx: isize, dy: isize, dz: isize) -> usize {
        let max = self.n as isize - 1;
        let cx = (x as isize + dx).clamp(0, max) as usize;
        let cy = (y as isize + dy).clamp(0, max) as usize;
        let cz = (z as isize + dz).clamp(0, max) as usize;
        self.index(cx, cy, cz)
    }

    /// Whether `(x, y, z)` lies on one of the six faces of the cube
    #[inline]
    #[must_use]
    pub const fn is_boundary(&self, x: usize, y: usize, z: usize) -> bool {
        let last = self.n - 1;
        x == 0 || y == 0 || z == 0 || x == last || y == last || z == last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_layout() {
        let grid = GridIndex::new(8);
        assert_eq!(grid.index(0, 0, 0), 0);
        assert_eq!(grid.index(1, 0, 0), 1);
        assert_eq!(grid.index(0, 1, 0), 8);
        assert_eq!(grid.index(0, 0, 1), 64);
        assert_eq!(grid.cell_count(), 512);
    }

    #[test]
    fn test_coords_inverse() {
        let grid = GridIndex::new(5);
        for idx in 0..grid.cell_count() {
            let (x, y, z) = grid.coords(idx);
            assert_eq!(grid.index(x, y, z), idx);
        }
    }

    #[test]
    fn test_offset_clamped_stays_in_range() {
        let grid = GridIndex::new(4);
        assert_eq!(grid.offset_clamped(0, 0, 0, -1, 0, 0), grid.index(0, 0, 0));
        assert_eq!(grid.offset_clamped(3, 3, 3, 1, 1, 1), grid.index(3, 3, 3));
        assert_eq!(grid.offset_clamped(1, 2, 3, 1, -1, 0), grid.index(2, 1, 3));
    }

    #[test]
    fn test_boundary_detection() {
        let grid = GridIndex::new(4);
        assert!(grid.is_boundary(0, 2, 2));
        assert!(grid.is_boundary(2, 3, 2));
        assert!(!grid.is_boundary(1, 2, 2));
    }
}
