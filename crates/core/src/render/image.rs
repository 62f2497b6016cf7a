//! Linear RGBA color buffers

use crate::core_types::Vec4;
use crate::error::{Result, SmokeError};

/// A row-major image of linear RGBA pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Vec4>,
}

impl ColorBuffer {
    /// Image filled with one color
    #[must_use]
    pub fn filled(width: usize, height: usize, color: Vec4) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Image from existing pixels
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidDimensions`] if `pixels.len() != width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Vec4>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(SmokeError::InvalidDimensions {
                expected_width: width,
                expected_height: height,
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row by row
    #[must_use]
    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Mutable pixels, row by row
    pub fn pixels_mut(&mut self) -> &mut [Vec4] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Vec4 {
        assert!(x < self.width && y < self.height, "Pixel out of bounds");
        self.pixels[y * self.width + x]
    }

    /// Quantize to 8-bit RGBA, clamping each channel to `[0, 1]`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.iter())
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}
