//! Debug views of the solver's internal fields

use super::camera::Ray;
use super::optics::Aabb;
use super::volume::VolumeTextures;
use crate::core_types::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Transmittance below which a debug ray stops
const DEBUG_CUTOFF: f32 = 0.01;

/// What the renderer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Lit density coloured by temperature
    #[default]
    Volumetric,
    /// Signed pressure
    Pressure,
    /// Velocity components as colour
    Velocity,
    /// Signed divergence
    Divergence,
}

impl RenderMode {
    /// Every mode, in selector order
    pub const ALL: [Self; 4] = [Self::Volumetric, Self::Pressure, Self::Velocity, Self::Divergence];

    /// Lowercase display name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Volumetric => "volumetric",
            Self::Pressure => "pressure",
            Self::Velocity => "velocity",
            Self::Divergence => "divergence",
        }
    }

    /// Check if this mode shows a raw solver field
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        !matches!(self, Self::Volumetric)
    }
}

/// Positive values in red, negative values in blue
#[inline]
fn signed_color(value: f32) -> Vec3 {
    if value > 0.0 {
        Vec3::new(value, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, -value)
    }
}

/// Magnitude and colour of a debug field at normalised coordinates
///
/// Returns `None` for [`RenderMode::Volumetric`].
#[must_use]
pub fn debug_sample(mode: RenderMode, textures: &VolumeTextures, uvw: Vec3) -> Option<(f32, Vec3)> {
    match mode {
        RenderMode::Volumetric => None,
        RenderMode::Pressure => {
            let p = textures.pressure.sample(uvw);
            Some((p.abs(), signed_color(p)))
        }
        RenderMode::Divergence => {
            let d = textures.divergence.sample(uvw);
            Some((d.abs(), signed_color(d)))
        }
        RenderMode::Velocity => {
            let v = textures.velocity.sample(uvw);
            Some((v.norm(), v.abs()))
        }
    }
}

/// March a debug ray through the volume and composite over `background`
///
/// No jitter is applied; rays stop once transmittance drops below 1%.
#[must_use]
pub fn march_debug(
    mode: RenderMode,
    textures: &VolumeTextures,
    bounds: &Aabb,
    ray: &Ray,
    span: (f32, f32),
    step: f32,
    background: Vec4,
) -> Vec4 {
    let (near, far) = span;
    let mut t = near.max(0.0);
    if t >= far {
        return background;
    }

    let mut transmittance = 1.0_f32;
    let mut color = Vec3::zeros();
    while t < far {
        let uvw = bounds.to_texture(ray.at(t));
        let Some((magnitude, sample_color)) = debug_sample(mode, textures, uvw) else {
            return background;
        };

        transmittance *= (-step * magnitude).exp();
        if magnitude > 0.0 {
            color += sample_color * (transmittance * step);
        }
        if transmittance < DEBUG_CUTOFF {
            break;
        }
        t += step;
    }

    let color = color + background.xyz() * transmittance;
    Vec4::new(color.x, color.y, color.z, 1.0 - transmittance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GridIndex;
    use crate::render::volume::SampledVolume;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb {
            min: Vec3::repeat(-1.0),
            max: Vec3::repeat(1.0),
        }
    }

    fn axis_ray() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    #[test]
    fn test_signed_colour() {
        assert_relative_eq!(signed_color(0.5), Vec3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(signed_color(-0.25), Vec3::new(0.0, 0.0, 0.25));
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&RenderMode::Divergence).unwrap();
        assert_eq!(json, "\"divergence\"");
        for mode in RenderMode::ALL {
            assert_eq!(json_name(mode), mode.name());
        }
    }

    fn json_name(mode: RenderMode) -> String {
        serde_json::to_string(&mode).unwrap().trim_matches('"').to_string()
    }

    #[test]
    fn test_empty_field_shows_background() {
        let textures = VolumeTextures::empty(8);
        let background = Vec4::new(0.2, 0.3, 0.4, 1.0);
        let ray = axis_ray();
        let span = unit_box().intersect(&ray).unwrap();
        let pixel = march_debug(RenderMode::Pressure, &textures, &unit_box(), &ray, span, 0.05, background);
        assert_relative_eq!(pixel, Vec4::new(0.2, 0.3, 0.4, 0.0));
    }

    #[test]
    fn test_negative_pressure_is_blue() {
        let n = 8;
        let grid = GridIndex::new(n);
        let mut textures = VolumeTextures::empty(n);
        textures.pressure = SampledVolume::from_slice(n, &vec![-2.0; grid.cell_count()]);

        let ray = axis_ray();
        let span = unit_box().intersect(&ray).unwrap();
        let pixel = march_debug(RenderMode::Pressure, &textures, &unit_box(), &ray, span, 0.05, Vec4::zeros());
        assert_eq!(pixel.x, 0.0);
        assert!(pixel.z > 0.0);
        assert!(pixel.w > 0.0);
    }

    #[test]
    fn test_volumetric_has_no_debug_sample() {
        let textures = VolumeTextures::empty(4);
        assert!(debug_sample(RenderMode::Volumetric, &textures, Vec3::repeat(0.5)).is_none());
    }
}
