//! Renderer configuration

use super::debug::RenderMode;
use crate::core_types::Vec3;
use crate::error::{Result, SmokeError};
use serde::{Deserialize, Serialize};

/// Parameters of the volumetric ray marcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fraction of density that absorbs light
    pub absorption: f32,
    /// Scattering coefficient
    pub scattering: f32,
    /// Henyey-Greenstein asymmetry in `[-1, 1]`
    pub phase_g: f32,
    /// View ray step in world units
    pub step_size: f32,
    /// Light ray step in world units
    pub light_step_size: f32,
    /// Maximum light ray sub-steps per sample
    pub light_steps: u32,
    /// Point light position in world space
    pub light_position: Vec3,
    /// Colour of the scattered light
    pub light_color: Vec3,
    /// Transmittance below which rays may terminate early
    pub roulette_threshold: f32,
    /// What the renderer shows
    pub mode: RenderMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            absorption: 0.35,
            scattering: 36.0,
            phase_g: 0.3,
            step_size: 0.05,
            light_step_size: 0.05,
            light_steps: 50,
            light_position: Vec3::new(30.0, 30.0, -30.0),
            light_color: Vec3::repeat(1.0),
            roulette_threshold: 0.01,
            mode: RenderMode::Volumetric,
        }
    }
}

impl RenderConfig {
    /// Check every parameter against its valid range
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("absorption", self.absorption), ("scattering", self.scattering)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SmokeError::invalid_config(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        for (field, value) in [
            ("step_size", self.step_size),
            ("light_step_size", self.light_step_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SmokeError::not_positive(field, value));
            }
        }
        if !(-1.0..=1.0).contains(&self.phase_g) {
            return Err(SmokeError::invalid_config(
                "phase_g",
                format!("must be in [-1, 1], got {}", self.phase_g),
            ));
        }
        if self.light_steps == 0 {
            return Err(SmokeError::invalid_config("light_steps", "must be at least 1"));
        }
        if !self.light_position.iter().all(|c| c.is_finite()) {
            return Err(SmokeError::invalid_config("light_position", "must be finite"));
        }
        if !self.light_color.iter().all(|c| c.is_finite() && *c >= 0.0) {
            return Err(SmokeError::invalid_config(
                "light_color",
                "must be finite and non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.roulette_threshold) {
            return Err(SmokeError::invalid_config(
                "roulette_threshold",
                format!("must be in [0, 1], got {}", self.roulette_threshold),
            ));
        }
        Ok(())
    }
}
