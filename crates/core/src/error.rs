//! Error types for the smoke simulation.
//!
//! Solver passes never fail mid-frame. Errors only surface at the edges:
//! configuration validation, impulse requests, grid reallocation and frame
//! composition.

use thiserror::Error;

/// Errors reported by the simulation API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmokeError {
    /// A configuration value is out of its accepted range.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// An impulse request could not be applied.
    #[error("invalid impulse: {reason}")]
    InvalidImpulse {
        /// Why it was rejected.
        reason: String,
    },

    /// Reallocating the fields for a new grid size failed.
    #[error("failed to allocate {bytes} bytes for a {grid_size}^3 grid")]
    Allocation {
        /// Requested grid side length.
        grid_size: usize,
        /// Total bytes requested across every field buffer.
        bytes: usize,
    },

    /// A color buffer does not have the dimensions the caller promised.
    #[error("buffer dimensions mismatch: expected {expected_width}x{expected_height}, got {width}x{height} ({len} pixels)")]
    InvalidDimensions {
        /// Declared width.
        expected_width: usize,
        /// Declared height.
        expected_height: usize,
        /// Width found.
        width: usize,
        /// Height found.
        height: usize,
        /// Pixel count found.
        len: usize,
    },
}

impl SmokeError {
    /// Create a config error for a field with a custom message.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Create a config error for a float that must be finite and positive.
    pub fn not_positive(field: &'static str, value: f32) -> Self {
        Self::invalid_config(field, format!("must be finite and positive, got {value}"))
    }

    /// Create an impulse error.
    pub fn invalid_impulse(reason: impl Into<String>) -> Self {
        Self::InvalidImpulse {
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SmokeError>;
