//! Quality presets for grid resolution
//!
//! This module defines quality presets that determine grid resolution and the
//! number of relaxation iterations. Higher quality means finer grids and more
//! nearly incompressible flow at a higher computational cost.

use super::config::SolverConfig;
use serde::{Deserialize, Serialize};

/// Quality preset determining grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// Ultra quality: 128³ grid
    Ultra,
    /// High quality: 64³ grid
    High,
    /// Medium quality: 32³ grid
    Medium,
    /// Low quality: 16³ grid
    Low,
}

impl QualityPreset {
    /// Grid side length for this preset
    #[must_use]
    pub const fn grid_size(&self) -> usize {
        match self {
            Self::Ultra => 128,
            Self::High => 64,
            Self::Medium => 32,
            Self::Low => 16,
        }
    }

    /// Diffusion relaxation rounds (`K`)
    #[must_use]
    pub const fn diffusion_iterations(&self) -> u32 {
        match self {
            Self::Ultra => 40,
            Self::High => 30,
            Self::Medium => 20,
            Self::Low => 10,
        }
    }

    /// Pressure Jacobi iterations (`M`)
    #[must_use]
    pub const fn pressure_iterations(&self) -> u32 {
        match self {
            Self::Ultra => 100,
            Self::High => 60,
            Self::Medium => 40,
            Self::Low => 20,
        }
    }

    /// Apply this preset's resolution and iteration counts to a configuration
    ///
    /// # Arguments
    ///
    /// * `base` - Configuration whose physical parameters are kept
    ///
    /// # Returns
    ///
    /// `base` with grid size and iteration counts replaced
    #[must_use]
    pub fn apply(&self, base: SolverConfig) -> SolverConfig {
        SolverConfig {
            grid_size: self.grid_size(),
            diffusion_iterations: self.diffusion_iterations(),
            pressure_iterations: self.pressure_iterations(),
            ..base
        }
    }

    /// Recommended preset for the current machine
    ///
    /// Based on the number of worker threads rayon will use.
    #[must_use]
    pub fn recommended() -> Self {
        match rayon::current_num_threads() {
            0..=3 => Self::Low,
            4..=11 => Self::Medium,
            _ => Self::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_sizes() {
        assert_eq!(QualityPreset::Ultra.grid_size(), 128);
        assert_eq!(QualityPreset::High.grid_size(), 64);
        assert_eq!(QualityPreset::Medium.grid_size(), 32);
        assert_eq!(QualityPreset::Low.grid_size(), 16);
    }

    #[test]
    fn test_apply_keeps_physics() {
        let base = SolverConfig {
            buoyancy: 2.5,
            ..SolverConfig::default()
        };
        let config = QualityPreset::Low.apply(base);
        assert_eq!(config.grid_size, 16);
        assert_eq!(config.pressure_iterations, 20);
        assert_eq!(config.buoyancy, 2.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_every_preset_is_valid() {
        for preset in [
            QualityPreset::Low,
            QualityPreset::Medium,
            QualityPreset::High,
            QualityPreset::Ultra,
        ] {
            assert!(preset.apply(SolverConfig::default()).validate().is_ok());
        }
    }

    #[test]
    fn test_recommended_is_not_ultra() {
        assert_ne!(QualityPreset::recommended(), QualityPreset::Ultra);
    }
}
