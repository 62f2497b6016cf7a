//! The closed set of solver kernels and the per-frame pipeline
//!
//! Every pass a backend can run is a [`Kernel`] variant with a fixed label,
//! workgroup shape, and set of fields read and written. The pipeline is built
//! once from a [`SolverConfig`] and replayed every frame.

use super::config::SolverConfig;
use super::impulse::Impulse;
use crate::grid::FieldKind;

/// Workgroup shape shared by every 3D kernel
pub const WORKGROUP_SIZE: [u32; 3] = [4, 4, 4];

/// Scalar fields that are advected and diffused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    /// Smoke density
    Density,
    /// Temperature
    Temperature,
}

impl ScalarField {
    /// Matching field kind
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Density => FieldKind::Density,
            Self::Temperature => FieldKind::Temperature,
        }
    }
}

/// One solver pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// Radial injection into velocity, density, temperature and pressure
    Impulse(Impulse),
    /// Relaxation diffusion of density and temperature
    Diffuse,
    /// Velocity self-advection with buoyancy
    AdvectVelocity,
    /// Advection of one scalar field through the velocity field
    AdvectScalar(ScalarField),
    /// Velocity divergence
    Divergence,
    /// One Jacobi iteration of the pressure solve
    PressureJacobi,
    /// Pressure-gradient subtraction from velocity
    GradientSubtract,
    /// Mirror boundary on pressure
    PressureBoundary,
}

impl Kernel {
    /// Stable label used for profiling and GPU pipeline names
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Impulse(_) => "impulse",
            Self::Diffuse => "diffuse",
            Self::AdvectVelocity => "advect_velocity",
            Self::AdvectScalar(ScalarField::Density) => "advect_density",
            Self::AdvectScalar(ScalarField::Temperature) => "advect_temperature",
            Self::Divergence => "divergence",
            Self::PressureJacobi => "pressure_jacobi",
            Self::GradientSubtract => "gradient_subtract",
            Self::PressureBoundary => "pressure_boundary",
        }
    }

    /// Workgroup shape for GPU dispatch
    #[must_use]
    pub const fn workgroup_size(&self) -> [u32; 3] {
        WORKGROUP_SIZE
    }

    /// Fields whose current buffer this pass reads
    #[must_use]
    pub const fn reads(&self) -> &'static [FieldKind] {
        match self {
            Self::Impulse(_) => &[
                FieldKind::Velocity,
                FieldKind::Density,
                FieldKind::Temperature,
                FieldKind::Pressure,
            ],
            Self::Diffuse => &[FieldKind::Density, FieldKind::Temperature],
            Self::AdvectVelocity => &[FieldKind::Velocity, FieldKind::Temperature],
            Self::AdvectScalar(ScalarField::Density) => &[FieldKind::Velocity, FieldKind::Density],
            Self::AdvectScalar(ScalarField::Temperature) => {
                &[FieldKind::Velocity, FieldKind::Temperature]
            }
            Self::Divergence => &[FieldKind::Velocity],
            Self::PressureJacobi => &[FieldKind::Pressure, FieldKind::Divergence],
            Self::GradientSubtract => &[FieldKind::Velocity, FieldKind::Pressure],
            Self::PressureBoundary => &[FieldKind::Pressure],
        }
    }

    /// Fields this pass writes
    #[must_use]
    pub const fn writes(&self) -> &'static [FieldKind] {
        match self {
            Self::Impulse(_) => &[
                FieldKind::Velocity,
                FieldKind::Density,
                FieldKind::Temperature,
                FieldKind::Pressure,
            ],
            Self::Diffuse => &[FieldKind::Density, FieldKind::Temperature],
            Self::AdvectVelocity | Self::GradientSubtract => &[FieldKind::Velocity],
            Self::AdvectScalar(ScalarField::Density) => &[FieldKind::Density],
            Self::AdvectScalar(ScalarField::Temperature) => &[FieldKind::Temperature],
            Self::Divergence => &[FieldKind::Divergence],
            Self::PressureJacobi | Self::PressureBoundary => &[FieldKind::Pressure],
        }
    }
}

/// Ordered list of kernels executed every frame
///
/// The impulse is not part of the pipeline; it is dispatched ahead of it only
/// on frames with a pending injection.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    kernels: Vec<Kernel>,
    pressure_iterations: u32,
}

impl Pipeline {
    /// Build the frame pipeline for a configuration
    #[must_use]
    pub fn build(config: &SolverConfig) -> Self {
        let jacobi = config.pressure_iterations as usize;
        let mut kernels = Vec::with_capacity(jacobi + 7);
        kernels.extend([
            Kernel::Diffuse,
            Kernel::AdvectVelocity,
            Kernel::AdvectScalar(ScalarField::Density),
            Kernel::AdvectScalar(ScalarField::Temperature),
            Kernel::Divergence,
        ]);
        kernels.extend(std::iter::repeat(Kernel::PressureJacobi).take(jacobi));
        kernels.extend([Kernel::GradientSubtract, Kernel::PressureBoundary]);

        Self {
            kernels,
            pressure_iterations: config.pressure_iterations,
        }
    }

    /// Kernels in execution order
    #[must_use]
    pub fn kernels(&self) -> &[Kernel] {
        &self.kernels
    }

    /// Number of passes per frame
    #[must_use]
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether the pipeline has no passes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Whether this pipeline still matches `config`
    #[must_use]
    pub fn matches(&self, config: &SolverConfig) -> bool {
        self.pressure_iterations == config.pressure_iterations
    }
}
