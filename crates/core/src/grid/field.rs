//! Double-buffered 3D field storage
//!
//! Every simulated quantity lives in a [`GridField`]: two owned buffers and an
//! index naming the one that is currently valid. Kernels read the current
//! buffer, write the other one, and the caller flips the index once the pass
//! has finished. Flipping is a single integer write, so no references into the
//! buffers survive a swap or a resize.

use crate::core_types::{GridIndex, Vec3};
use crate::error::{Result, SmokeError};

/// Value stored in a single grid cell
///
/// Implemented for `f32` (scalar fields) and [`Vec3`] (velocity).
pub trait CellValue: Copy + Send + Sync + PartialEq + std::fmt::Debug + 'static {
    /// Number of `f32` components per cell
    const COMPONENTS: usize;

    /// Additive identity, used for clamped boundaries and fresh allocations
    fn zero() -> Self;

    /// Linear interpolation `a + (b - a)·t`
    fn lerp(a: Self, b: Self, t: f32) -> Self;

    /// Multiply every component by `s`
    fn scale(self, s: f32) -> Self;
}

impl CellValue for f32 {
    const COMPONENTS: usize = 1;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    #[inline]
    fn scale(self, s: f32) -> Self {
        self * s
    }
}

impl CellValue for Vec3 {
    const COMPONENTS: usize = 3;

    #[inline]
    fn zero() -> Self {
        Vec3::zeros()
    }

    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    #[inline]
    fn scale(self, s: f32) -> Self {
        self * s
    }
}

/// Allocate a zeroed buffer, reporting failure instead of aborting
fn try_zeroed<T: CellValue>(len: usize) -> Option<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.resize(len, T::zero());
    Some(buffer)
}

/// Ping-pong storage for one field over a cubic grid
#[derive(Debug, Clone)]
pub struct GridField<T: CellValue> {
    label: &'static str,
    grid: GridIndex,
    buffers: [Vec<T>; 2],
    current: usize,
}

impl<T: CellValue> GridField<T> {
    /// Create a zeroed field of side `n`
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::Allocation`] if either buffer cannot be reserved.
    pub fn try_new(label: &'static str, n: usize) -> Result<Self> {
        let grid = GridIndex::new(n);
        let len = grid.cell_count();
        let allocation_error = || SmokeError::Allocation {
            grid_size: n,
            bytes: Self::bytes_for(n),
        };
        let front = try_zeroed(len).ok_or_else(allocation_error)?;
        let back = try_zeroed(len).ok_or_else(allocation_error)?;
        Ok(Self {
            label,
            grid,
            buffers: [front, back],
            current: 0,
        })
    }

    /// Bytes needed by both buffers of a field of side `n`
    #[must_use]
    pub fn bytes_for(n: usize) -> usize {
        [n, n, n, std::mem::size_of::<T>()]
            .into_iter()
            .fold(2_usize, usize::saturating_mul)
    }

    /// Field label, used in logs and pass names
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Grid indexing helper
    #[must_use]
    pub fn grid(&self) -> GridIndex {
        self.grid
    }

    /// Grid side length
    #[must_use]
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Number of `f32` components per cell
    #[must_use]
    pub fn components(&self) -> usize {
        T::COMPONENTS
    }

    /// Which of the two buffers is currently the read buffer (0 or 1)
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Current (read) buffer
    #[must_use]
    pub fn read(&self) -> &[T] {
        &self.buffers[self.current]
    }

    /// Next (write) buffer
    #[must_use]
    pub fn write(&self) -> &[T] {
        &self.buffers[1 - self.current]
    }

    /// Mutable access to the write buffer
    pub fn write_mut(&mut self) -> &mut [T] {
        &mut self.buffers[1 - self.current]
    }

    /// Split borrow: read buffer immutably, write buffer mutably
    pub fn read_write(&mut self) -> (&[T], &mut [T]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Mutable access to the read buffer
    ///
    /// Only the impulse injector mutates the current buffer in place; its per-cell
    /// update is local and additive.
    pub fn read_mut(&mut self) -> &mut [T] {
        &mut self.buffers[self.current]
    }

    /// Make the freshly written buffer current
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Copy the read buffer into the write buffer
    pub fn seed_write_from_read(&mut self) {
        let (read, write) = self.read_write();
        write.copy_from_slice(read);
    }

    /// Fill both buffers with a value
    pub fn fill(&mut self, value: T) {
        for buffer in &mut self.buffers {
            buffer.fill(value);
        }
    }

    /// Read-buffer value at `(x, y, z)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> T {
        let n = self.size();
        assert!(x < n && y < n && z < n, "Coordinates out of bounds");
        self.read()[self.grid.index(x, y, z)]
    }

    /// Set a read-buffer value at `(x, y, z)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let n = self.size();
        assert!(x < n && y < n && z < n, "Coordinates out of bounds");
        let idx = self.grid.index(x, y, z);
        self.read_mut()[idx] = value;
    }
}

/// Identifies one of the simulated fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Vector velocity field
    Velocity,
    /// Smoke amount, clamped to `[0, 1]`
    Density,
    /// Temperature, clamped to `[0, 1]`; drives buoyancy and emission color
    Temperature,
    /// Pressure, persisted between frames as the Jacobi warm start
    Pressure,
    /// Velocity divergence, recomputed every frame
    Divergence,
}

impl FieldKind {
    /// All scalar fields
    pub const SCALARS: [FieldKind; 4] = [
        FieldKind::Density,
        FieldKind::Temperature,
        FieldKind::Pressure,
        FieldKind::Divergence,
    ];

    /// Human-readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::Density => "density",
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Divergence => "divergence",
        }
    }
}

/// Every field of the simulation, allocated and resized together
#[derive(Debug, Clone)]
pub struct FieldSet {
    /// Velocity (3 components per cell)
    pub velocity: GridField<Vec3>,
    /// Smoke density
    pub density: GridField<f32>,
    /// Temperature
    pub temperature: GridField<f32>,
    /// Pressure
    pub pressure: GridField<f32>,
    /// Divergence
    pub divergence: GridField<f32>,
}

impl FieldSet {
    /// Allocate every field for a grid of side `n`
    ///
    /// Either all fields are allocated or none are; a failure leaves any
    /// previously held `FieldSet` untouched because the caller only replaces it
    /// on success.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::Allocation`] with the total byte count if any
    /// buffer cannot be reserved.
    pub fn try_new(n: usize) -> Result<Self> {
        let total = Self::bytes_for(n);
        let with_total = |err: SmokeError| match err {
            SmokeError::Allocation { grid_size, .. } => SmokeError::Allocation {
                grid_size,
                bytes: total,
            },
            other => other,
        };
        Ok(Self {
            velocity: GridField::try_new("velocity", n).map_err(with_total)?,
            density: GridField::try_new("density", n).map_err(with_total)?,
            temperature: GridField::try_new("temperature", n).map_err(with_total)?,
            pressure: GridField::try_new("pressure", n).map_err(with_total)?,
            divergence: GridField::try_new("divergence", n).map_err(with_total)?,
        })
    }

    /// Total bytes of all field buffers for a grid of side `n`
    #[must_use]
    pub fn bytes_for(n: usize) -> usize {
        GridField::<f32>::bytes_for(n)
            .saturating_mul(4)
            .saturating_add(GridField::<Vec3>::bytes_for(n))
    }

    /// Grid side length
    #[must_use]
    pub fn size(&self) -> usize {
        self.density.size()
    }

    /// Scalar field by kind
    ///
    /// Returns `None` for [`FieldKind::Velocity`].
    #[must_use]
    pub fn scalar(&self, kind: FieldKind) -> Option<&GridField<f32>> {
        match kind {
            FieldKind::Velocity => None,
            FieldKind::Density => Some(&self.density),
            FieldKind::Temperature => Some(&self.temperature),
            FieldKind::Pressure => Some(&self.pressure),
            FieldKind::Divergence => Some(&self.divergence),
        }
    }

    /// Mutable scalar field by kind
    pub fn scalar_mut(&mut self, kind: FieldKind) -> Option<&mut GridField<f32>> {
        match kind {
            FieldKind::Velocity => None,
            FieldKind::Density => Some(&mut self.density),
            FieldKind::Temperature => Some(&mut self.temperature),
            FieldKind::Pressure => Some(&mut self.pressure),
            FieldKind::Divergence => Some(&mut self.divergence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = GridField::<f32>::try_new("density", 8).unwrap();
        assert_eq!(field.size(), 8);
        assert_eq!(field.read().len(), 512);
        assert_eq!(field.write().len(), 512);
        assert_eq!(field.components(), 1);
        assert!(field.read().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_vector_field_components() {
        let field = GridField::<Vec3>::try_new("velocity", 4).unwrap();
        assert_eq!(field.components(), 3);
        assert!(field.read().iter().all(|v| *v == Vec3::zeros()));
    }

    #[test]
    fn test_swap_promotes_written_data() {
        let mut field = GridField::<f32>::try_new("density", 4).unwrap();
        field.write_mut()[5] = 2.5;
        assert_eq!(field.read()[5], 0.0);

        field.swap();
        assert_eq!(field.read()[5], 2.5);
        assert_eq!(field.current_index(), 1);

        field.swap();
        assert_eq!(field.current_index(), 0);
    }

    #[test]
    fn test_read_write_split_borrow() {
        let mut field = GridField::<f32>::try_new("pressure", 4).unwrap();
        field.set(1, 1, 1, 3.0);
        field.swap();
        field.set(1, 1, 1, 7.0);

        let (read, write) = field.read_write();
        write[0] = read[field_index(1, 1, 1)];
        assert_eq!(field.write()[0], 7.0);
    }

    fn field_index(x: usize, y: usize, z: usize) -> usize {
        GridIndex::new(4).index(x, y, z)
    }

    #[test]
    fn test_seed_and_fill() {
        let mut field = GridField::<f32>::try_new("temperature", 4).unwrap();
        field.set(2, 2, 2, 0.5);
        field.seed_write_from_read();
        assert_eq!(field.write(), field.read());

        field.fill(0.25);
        assert!(field.read().iter().all(|&v| v == 0.25));
        assert!(field.write().iter().all(|&v| v == 0.25));
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = GridField::<f32>::try_new("density", 4).unwrap();
        let _ = field.get(4, 0, 0);
    }

    #[test]
    fn test_field_set_allocation_size() {
        let set = FieldSet::try_new(8).unwrap();
        assert_eq!(set.size(), 8);
        assert_eq!(FieldSet::bytes_for(8), 2 * 512 * 12 + 4 * 2 * 512 * 4);
        assert!(set.scalar(FieldKind::Velocity).is_none());
        assert_eq!(set.scalar(FieldKind::Pressure).unwrap().label(), "pressure");
    }

    #[test]
    fn test_impossible_allocation_is_reported() {
        let err = GridField::<f32>::try_new("density", 1 << 20).unwrap_err();
        assert!(matches!(err, SmokeError::Allocation { grid_size, .. } if grid_size == 1 << 20));
    }
}
