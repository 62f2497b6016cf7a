//! Optical helpers for the volume renderer
//!
//! Slab intersection, the Henyey-Greenstein phase function, the emission
//! ramp for hot smoke and the per-pixel jitter hash.

use super::camera::Ray;
use crate::core_types::Vec3;
use std::f32::consts::PI;

/// Emission tint of fully hot smoke
pub const HOT_COLOR: [f32; 3] = [3.5, 0.8, 0.0];

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Entry and exit distances along a ray, or `None` on a miss
    ///
    /// The entry distance may be negative when the origin is inside the box.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        intersect_box(ray.origin, ray.direction, self.min, self.max)
    }

    /// Map a world position to normalised texture coordinates
    #[inline]
    #[must_use]
    pub fn to_texture(&self, p: Vec3) -> Vec3 {
        (p - self.min).component_div(&(self.max - self.min))
    }
}

/// Slab test of a ray against a box
///
/// Returns `None` when `t_near > t_far` or the box lies entirely behind the origin.
#[must_use]
pub fn intersect_box(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<(f32, f32)> {
    let t_min = (min - origin).component_div(&direction);
    let t_max = (max - origin).component_div(&direction);
    let t1 = t_min.inf(&t_max);
    let t2 = t_min.sup(&t_max);
    let near = t1.max();
    let far = t2.min();
    if near > far || far < 0.0 {
        None
    } else {
        Some((near, far))
    }
}

/// Henyey-Greenstein phase function
///
/// # Arguments
///
/// * `g` - Asymmetry in `[-1, 1]`; positive values favour forward scattering
/// * `cos_theta` - Cosine of the angle between view and light directions
#[must_use]
pub fn henyey_greenstein(g: f32, cos_theta: f32) -> f32 {
    let denom = (1.0 + g * g - 2.0 * g * cos_theta).max(1e-4);
    (1.0 - g * g) / (4.0 * PI * denom * denom.sqrt())
}

/// Blend from white to [`HOT_COLOR`] as temperature goes from 0 to 1
#[must_use]
pub fn temperature_color(temperature: f32) -> Vec3 {
    let t = temperature.clamp(0.0, 1.0);
    Vec3::repeat(1.0).lerp(&Vec3::from(HOT_COLOR), t)
}

/// Cheap per-pixel pseudo-random value in `[0, 1)`
#[inline]
#[must_use]
pub fn hash(x: f32) -> f32 {
    let v = (x * 12.9898).sin() * 43758.5453;
    let f = v - v.floor();
    // Rounding can land exactly on 1 for tiny negative inputs
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb {
            min: Vec3::repeat(-1.0),
            max: Vec3::repeat(1.0),
        }
    }

    #[test]
    fn test_ray_hits_box() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        let (near, far) = unit_box().intersect(&ray).unwrap();
        assert_relative_eq!(near, 4.0);
        assert_relative_eq!(far, 6.0);
    }

    #[test]
    fn test_ray_misses_box() {
        let ray = Ray {
            origin: Vec3::new(0.0, 3.0, 5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        assert!(unit_box().intersect(&ray).is_none());

        let behind = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        };
        assert!(unit_box().intersect(&behind).is_none());
    }

    #[test]
    fn test_origin_inside_box() {
        let ray = Ray {
            origin: Vec3::zeros(),
            direction: Vec3::new(1.0, 0.0, 0.0),
        };
        let (near, far) = unit_box().intersect(&ray).unwrap();
        assert!(near < 0.0);
        assert_relative_eq!(far, 1.0);
    }

    #[test]
    fn test_texture_coordinates() {
        let uvw = unit_box().to_texture(Vec3::new(-1.0, 0.0, 1.0));
        assert_relative_eq!(uvw, Vec3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn test_isotropic_phase() {
        assert_relative_eq!(henyey_greenstein(0.0, 0.3), 1.0 / (4.0 * PI), epsilon = 1e-6);
    }

    #[test]
    fn test_forward_scattering_dominates() {
        assert!(henyey_greenstein(0.3, 1.0) > henyey_greenstein(0.3, -1.0));
    }

    #[test]
    fn test_temperature_ramp() {
        assert_relative_eq!(temperature_color(0.0), Vec3::repeat(1.0));
        assert_relative_eq!(temperature_color(1.0), Vec3::from(HOT_COLOR));
        assert_relative_eq!(temperature_color(4.0), Vec3::from(HOT_COLOR));
    }

    #[test]
    fn test_hash_range() {
        for i in 0..100 {
            let h = hash(i as f32 * 1.7);
            assert!((0.0..1.0).contains(&h));
        }
    }
}
