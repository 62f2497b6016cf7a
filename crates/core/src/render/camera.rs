//! Camera pose and primary ray generation

use crate::core_types::{Mat4, Vec3, Vec4};
use crate::error::{Result, SmokeError};
use nalgebra::Point3;

/// View and projection supplied by the host each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// World-to-view transform
    pub view: Mat4,
    /// View-to-clip transform (OpenGL clip conventions, near plane at z = -1)
    pub projection: Mat4,
    /// Camera position in world space
    pub position: Vec3,
}

impl CameraPose {
    /// Pose from explicit matrices
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4, position: Vec3) -> Self {
        Self {
            view,
            projection,
            position,
        }
    }

    /// Right-handed perspective camera looking from `eye` at `target`
    ///
    /// # Arguments
    ///
    /// * `eye` - Camera position
    /// * `target` - Point the camera looks at
    /// * `up` - Approximate up direction
    /// * `fovy` - Vertical field of view in radians
    /// * `aspect` - Width over height
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fovy: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up);
        let projection = Mat4::new_perspective(aspect, fovy, 0.1, 100.0);
        Self::new(view, projection, eye)
    }

    /// Ray generator for an image of `width` x `height` pixels
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] if either matrix is singular.
    pub fn rays(&self, width: usize, height: usize) -> Result<RayGenerator> {
        let inverse_view = self
            .view
            .try_inverse()
            .ok_or_else(|| SmokeError::invalid_config("camera.view", "matrix is not invertible"))?;
        let inverse_projection = self.projection.try_inverse().ok_or_else(|| {
            SmokeError::invalid_config("camera.projection", "matrix is not invertible")
        })?;
        Ok(RayGenerator {
            inverse_view,
            inverse_projection,
            origin: self.position,
            width,
            height,
        })
    }
}

/// A half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Point at parameter `t`
    #[inline]
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Per-pixel ray construction with the inverse matrices precomputed
#[derive(Debug, Clone, Copy)]
pub struct RayGenerator {
    inverse_view: Mat4,
    inverse_projection: Mat4,
    origin: Vec3,
    width: usize,
    height: usize,
}

impl RayGenerator {
    /// Primary ray through the centre of pixel `(px, py)`
    ///
    /// The pixel centre is mapped to NDC (`y` pointing up), placed on the near
    /// plane, un-projected into view space and then into world space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ray(&self, px: usize, py: usize) -> Ray {
        let ndc_x = 2.0 * (px as f32 + 0.5) / self.width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * (py as f32 + 0.5) / self.height as f32;

        let eye = self.inverse_projection * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let eye = eye.xyz() / eye.w;
        let world = self.inverse_view * eye.push(1.0);

        let direction = (world.xyz() - self.origin)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vec3::z());
        Ray {
            origin: self.origin,
            direction,
        }
    }
}
