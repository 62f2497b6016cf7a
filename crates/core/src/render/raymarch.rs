//! Volumetric ray marcher
//!
//! Every pixel casts one primary ray through the world box of the simulation
//! cube, accumulating absorption and single scattering from a point light.
//! Rows are shaded in parallel; the background is read from an immutable
//! snapshot and the result is written to a new buffer.

use super::camera::{CameraPose, Ray, RayGenerator};
use super::config::RenderConfig;
use super::debug::{march_debug, RenderMode};
use super::image::ColorBuffer;
use super::optics::{hash, henyey_greenstein, temperature_color, Aabb};
use super::volume::{VolumeTextures, VolumeTransform};
use crate::core_types::{Vec3, Vec4};
use crate::error::Result;
use rayon::prelude::*;

/// Gain applied to the phase function of in-scattered light
pub const PHASE_GAIN: f32 = 5.0;

/// Fraction of one step used to jitter ray starts
const JITTER_SCALE: f32 = 0.01;

/// Everything a pixel needs, shared across rows
struct MarchContext<'a> {
    rays: RayGenerator,
    bounds: Aabb,
    textures: &'a VolumeTextures,
    config: &'a RenderConfig,
    width: usize,
}

/// Render the volume over `background`
///
/// # Arguments
///
/// * `camera` - View and projection for this frame
/// * `background` - Previous frame; rays that miss the volume copy it unchanged
/// * `textures` - Field snapshots taken after the solver pass
/// * `transform` - Placement of the cube in world space
/// * `config` - Optical parameters and render mode
///
/// # Errors
///
/// Returns [`crate::SmokeError::InvalidConfig`] if `config` is out of range
/// or a camera matrix is singular.
pub fn render_volume(
    camera: &CameraPose,
    background: &ColorBuffer,
    textures: &VolumeTextures,
    transform: &VolumeTransform,
    config: &RenderConfig,
) -> Result<ColorBuffer> {
    config.validate()?;
    let width = background.width();
    let height = background.height();
    let mut output = background.clone();
    if width == 0 || height == 0 {
        return Ok(output);
    }

    let context = MarchContext {
        rays: camera.rays(width, height)?,
        bounds: transform.world_bounds(),
        textures,
        config,
        width,
    };

    output
        .pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(py, row)| {
            for (px, pixel) in row.iter_mut().enumerate() {
                *pixel = shade_pixel(&context, px, py, *pixel);
            }
        });
    Ok(output)
}

fn shade_pixel(context: &MarchContext<'_>, px: usize, py: usize, background: Vec4) -> Vec4 {
    let ray = context.rays.ray(px, py);
    let Some(span) = context.bounds.intersect(&ray) else {
        return background;
    };

    match context.config.mode {
        RenderMode::Volumetric => march_volumetric(context, &ray, span, px, py, background),
        mode => march_debug(
            mode,
            context.textures,
            &context.bounds,
            &ray,
            span,
            context.config.step_size,
            background,
        ),
    }
}

fn march_volumetric(
    context: &MarchContext<'_>,
    ray: &Ray,
    (near, far): (f32, f32),
    px: usize,
    py: usize,
    background: Vec4,
) -> Vec4 {
    let config = context.config;
    let step = config.step_size;
    let seed = (px + py * context.width) as f32;

    let mut t = near.max(0.0) + step * hash(seed) * JITTER_SCALE;
    if t >= far {
        return background;
    }

    let extinction = config.absorption + config.scattering;
    let mut transmittance = 1.0_f32;
    let mut color = Vec3::zeros();

    while t < far {
        let p = ray.at(t);
        let uvw = context.bounds.to_texture(p);
        let density = context.textures.density.sample(uvw);

        if density > 0.0 {
            transmittance *= (-step * config.absorption * density * extinction).exp();

            let to_light = (config.light_position - p)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::y);
            let light = light_transmittance(context, p, to_light, extinction);
            let phase = henyey_greenstein(config.phase_g, ray.direction.dot(&to_light));
            let temperature = context.textures.temperature.sample(uvw);

            let weight = light
                * phase
                * PHASE_GAIN
                * config.scattering
                * transmittance
                * step
                * density;
            color += config
                .light_color
                .component_mul(&temperature_color(temperature))
                * weight;
        }

        if transmittance < config.roulette_threshold && hash(transmittance * 10.0 + seed) > 0.5 {
            break;
        }
        t += step;
    }

    let color = color + background.xyz() * transmittance;
    Vec4::new(color.x, color.y, color.z, 1.0 - transmittance)
}

/// Fraction of the light reaching `p` through the smoke between it and the light
fn light_transmittance(context: &MarchContext<'_>, p: Vec3, to_light: Vec3, extinction: f32) -> f32 {
    let config = context.config;
    let towards = Ray {
        origin: p,
        direction: to_light,
    };
    let exit = context.bounds.intersect(&towards).map_or(0.0, |(_, far)| far);

    let mut light_density = 0.0_f32;
    for i in 0..config.light_steps {
        let s = config.light_step_size * i as f32;
        if s > exit || light_density > 1.0 {
            break;
        }
        let uvw = context.bounds.to_texture(towards.at(s));
        light_density += context.textures.density.sample(uvw);
    }
    (-light_density * config.light_step_size * extinction).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GridIndex;
    use crate::render::volume::SampledVolume;
    use std::f32::consts::FRAC_PI_2;

    fn camera() -> CameraPose {
        CameraPose::look_at(Vec3::new(0.0, 0.0, 4.0), Vec3::zeros(), Vec3::y(), FRAC_PI_2, 1.0)
    }

    fn filled_textures(n: usize, density: f32, temperature: f32) -> VolumeTextures {
        let cells = GridIndex::new(n).cell_count();
        let mut textures = VolumeTextures::empty(n);
        textures.density = SampledVolume::from_slice(n, &vec![density; cells]);
        textures.temperature = SampledVolume::from_slice(n, &vec![temperature; cells]);
        textures
    }

    #[test]
    fn test_empty_volume_keeps_background_colour() {
        let background = ColorBuffer::filled(16, 16, Vec4::new(0.1, 0.2, 0.3, 1.0));
        let textures = VolumeTextures::empty(8);
        let image = render_volume(
            &camera(),
            &background,
            &textures,
            &VolumeTransform::default(),
            &RenderConfig::default(),
        )
        .unwrap();

        // Centre ray hits the cube: colour passes through, alpha becomes 1 - T = 0
        let centre = image.get(8, 8);
        assert!((centre.x - 0.1).abs() < 1e-6);
        assert!((centre.z - 0.3).abs() < 1e-6);
        assert!(centre.w.abs() < 1e-6);
    }

    #[test]
    fn test_missed_pixels_are_untouched() {
        let background = ColorBuffer::filled(32, 32, Vec4::new(0.5, 0.5, 0.5, 0.25));
        let transform = VolumeTransform::new(Vec3::zeros(), 0.25);
        let image = render_volume(
            &camera(),
            &background,
            &filled_textures(4, 1.0, 0.0),
            &transform,
            &RenderConfig::default(),
        )
        .unwrap();
        assert_eq!(image.get(0, 0), background.get(0, 0));
    }

    #[test]
    fn test_dense_smoke_is_opaque() {
        let background = ColorBuffer::filled(8, 8, Vec4::zeros());
        let image = render_volume(
            &camera(),
            &background,
            &filled_textures(8, 1.0, 0.5),
            &VolumeTransform::default(),
            &RenderConfig::default(),
        )
        .unwrap();
        let centre = image.get(4, 4);
        assert!(centre.w > 0.9, "alpha {}", centre.w);
        assert!(centre.x > 0.0);
    }

    #[test]
    fn test_hot_smoke_is_redder() {
        let background = ColorBuffer::filled(8, 8, Vec4::zeros());
        let config = RenderConfig::default();
        let render = |temperature| {
            render_volume(
                &camera(),
                &background,
                &filled_textures(8, 0.2, temperature),
                &VolumeTransform::default(),
                &config,
            )
            .unwrap()
            .get(4, 4)
        };
        let cold = render(0.0);
        let hot = render(1.0);
        assert!(hot.x / hot.z.max(1e-6) > cold.x / cold.z.max(1e-6));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let background = ColorBuffer::filled(4, 4, Vec4::zeros());
        let config = RenderConfig {
            step_size: 0.0,
            ..RenderConfig::default()
        };
        let result = render_volume(
            &camera(),
            &background,
            &VolumeTextures::empty(4),
            &VolumeTransform::default(),
            &config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_mode_renders_velocity() {
        let n = 8;
        let cells = GridIndex::new(n).cell_count();
        let mut textures = VolumeTextures::empty(n);
        textures.velocity = SampledVolume::from_slice(n, &vec![Vec3::new(0.0, 2.0, 0.0); cells]);
        let config = RenderConfig {
            mode: RenderMode::Velocity,
            ..RenderConfig::default()
        };
        let background = ColorBuffer::filled(8, 8, Vec4::zeros());
        let image = render_volume(&camera(), &background, &textures, &VolumeTransform::default(), &config)
            .unwrap();
        let centre = image.get(4, 4);
        assert!(centre.y > 0.0);
        assert_eq!(centre.x, 0.0);
    }
}
