//! Sampling textures the renderer marches through
//!
//! Each texture is a per-frame snapshot of one solver field. Lookups use
//! normalised coordinates in `[0, 1]³` with texel centres at `(i + 0.5) / n`
//! and clamp-to-edge trilinear filtering.

use super::optics::Aabb;
use crate::core_types::{GridIndex, Mat4, Vec3, Vec4};
use crate::grid::{sample_trilinear, CellValue, FieldKind};
use crate::solver::SmokeSolver;

/// Read-only copy of one field with filtered lookups
#[derive(Debug, Clone)]
pub struct SampledVolume<T: CellValue> {
    grid: GridIndex,
    data: Vec<T>,
}

impl<T: CellValue> SampledVolume<T> {
    /// Zero-filled volume of side `n`
    #[must_use]
    pub fn empty(n: usize) -> Self {
        let grid = GridIndex::new(n);
        Self {
            grid,
            data: vec![T::zero(); grid.cell_count()],
        }
    }

    /// Volume copied from a field buffer
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not `n³`.
    #[must_use]
    pub fn from_slice(n: usize, data: &[T]) -> Self {
        let grid = GridIndex::new(n);
        assert_eq!(data.len(), grid.cell_count(), "Volume data does not match grid size");
        Self {
            grid,
            data: data.to_vec(),
        }
    }

    /// Replace the contents, reusing the allocation when the size is unchanged
    fn copy_from(&mut self, n: usize, data: &[T]) {
        self.grid = GridIndex::new(n);
        self.data.clear();
        self.data.extend_from_slice(data);
    }

    /// Side length
    #[must_use]
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Raw texel data
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Filtered lookup at normalised coordinates
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&self, uvw: Vec3) -> T {
        let n = self.grid.size() as f32;
        let pos = uvw * n - Vec3::repeat(0.5);
        sample_trilinear(&self.data, self.grid, pos)
    }
}

/// Every texture the render modes need
#[derive(Debug, Clone)]
pub struct VolumeTextures {
    /// Smoke density
    pub density: SampledVolume<f32>,
    /// Temperature
    pub temperature: SampledVolume<f32>,
    /// Pressure, for the pressure debug view
    pub pressure: SampledVolume<f32>,
    /// Divergence, for the divergence debug view
    pub divergence: SampledVolume<f32>,
    /// Velocity, for the velocity debug view
    pub velocity: SampledVolume<Vec3>,
}

impl VolumeTextures {
    /// Zero-filled textures of side `n`
    #[must_use]
    pub fn empty(n: usize) -> Self {
        Self {
            density: SampledVolume::empty(n),
            temperature: SampledVolume::empty(n),
            pressure: SampledVolume::empty(n),
            divergence: SampledVolume::empty(n),
            velocity: SampledVolume::empty(n),
        }
    }

    /// Snapshot the solver's current buffers
    pub fn refresh(&mut self, solver: &dyn SmokeSolver) {
        let n = solver.grid_size();
        for (kind, texture) in [
            (FieldKind::Density, &mut self.density),
            (FieldKind::Temperature, &mut self.temperature),
            (FieldKind::Pressure, &mut self.pressure),
            (FieldKind::Divergence, &mut self.divergence),
        ] {
            match solver.read_scalar(kind) {
                Some(values) => texture.copy_from(n, &values),
                None => *texture = SampledVolume::empty(n),
            }
        }
        self.velocity.copy_from(n, &solver.read_velocity());
    }

    /// Side length of the snapshot
    #[must_use]
    pub fn size(&self) -> usize {
        self.density.size()
    }
}

/// Placement of the simulation cube in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeTransform {
    /// Maps the cube `[-1, 1]³` into world space
    pub model: Mat4,
}

impl Default for VolumeTransform {
    fn default() -> Self {
        Self {
            model: Mat4::identity(),
        }
    }
}

impl VolumeTransform {
    /// Uniform scale followed by a translation
    #[must_use]
    pub fn new(center: Vec3, half_extent: f32) -> Self {
        Self {
            model: Mat4::new_translation(&center) * Mat4::new_scaling(half_extent),
        }
    }

    /// World-space box enclosing the transformed cube
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        for corner in 0..8u8 {
            let sign = |bit: u8| if corner & bit == 0 { -1.0 } else { 1.0 };
            let p = self.model * Vec4::new(sign(1), sign(2), sign(4), 1.0);
            let p = p.xyz() / p.w;
            min = min.inf(&p);
            max = max.sup(&p);
        }
        Aabb { min, max }
    }
}
