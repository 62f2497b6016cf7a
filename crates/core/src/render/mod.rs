//! Volumetric smoke renderer
//!
//! Turns the solver's density and temperature fields into an image by ray
//! marching through the simulation cube. Debug modes show pressure, velocity
//! or divergence instead.

pub mod camera;
pub mod config;
pub mod debug;
pub mod image;
pub mod optics;
pub mod raymarch;
pub mod volume;

pub use camera::{CameraPose, Ray, RayGenerator};
pub use config::RenderConfig;
pub use debug::RenderMode;
pub use image::ColorBuffer;
pub use optics::{henyey_greenstein, intersect_box, temperature_color, Aabb, HOT_COLOR};
pub use raymarch::{render_volume, PHASE_GAIN};
pub use volume::{SampledVolume, VolumeTextures, VolumeTransform};
