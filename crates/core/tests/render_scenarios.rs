//! Renderer scenarios driven through `SmokeSimulation`

mod common;

use smoke_sim_core::render::VolumeTransform;
use smoke_sim_core::{
    CameraPose, ColorBuffer, CpuSmokeSolver, RenderConfig, RenderMode, SmokeSimulation,
    SolverConfig, Vec3, Vec4,
};
use std::f32::consts::FRAC_PI_3;

const WIDTH: usize = 24;
const HEIGHT: usize = 16;

fn simulation(n: usize) -> SmokeSimulation {
    common::init_test_logging();
    let config = SolverConfig {
        grid_size: n,
        ..SolverConfig::default()
    };
    let solver = Box::new(CpuSmokeSolver::new(&config).unwrap());
    SmokeSimulation::with_solver(solver, config, RenderConfig::default(), WIDTH, HEIGHT)
}

fn camera() -> CameraPose {
    CameraPose::look_at(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::zeros(),
        Vec3::y(),
        FRAC_PI_3,
        WIDTH as f32 / HEIGHT as f32,
    )
}

#[test]
fn test_empty_volume_composites_background() {
    let mut sim = simulation(8);
    sim.advance(1.0 / 60.0).unwrap();

    let background = ColorBuffer::filled(WIDTH, HEIGHT, Vec4::new(0.2, 0.4, 0.6, 1.0));
    let image = sim.render_frame(&camera(), &background).unwrap();

    // Rays through the cube see no smoke: background colour, alpha 1 - T = 0
    let centre = image.get(WIDTH / 2, HEIGHT / 2);
    assert!((centre.x - 0.2).abs() < 1e-6);
    assert!((centre.y - 0.4).abs() < 1e-6);
    assert!((centre.z - 0.6).abs() < 1e-6);
    assert!(centre.w.abs() < 1e-6);

    // Rays that miss the cube keep the background untouched
    assert_eq!(image.get(0, 0), background.get(0, 0));
}

#[test]
fn test_injected_smoke_becomes_visible() {
    let mut sim = simulation(16);
    sim.inject_impulse(Vec3::new(8.0, 8.0, 8.0), 5.0, 1.0).unwrap();
    let report = sim.advance(1.0 / 60.0).unwrap();
    assert!(report.max_density > 0.0);

    let background = ColorBuffer::filled(WIDTH, HEIGHT, Vec4::zeros());
    let image = sim.render_frame(&camera(), &background).unwrap();
    let centre = image.get(WIDTH / 2, HEIGHT / 2);
    assert!(centre.w > 0.0, "alpha {}", centre.w);
    assert!(centre.x > 0.0);
}

#[test]
fn test_moved_volume_leaves_centre_clear() {
    let mut sim = simulation(16);
    sim.inject_impulse(Vec3::new(8.0, 8.0, 8.0), 5.0, 1.0).unwrap();
    sim.advance(1.0 / 60.0).unwrap();
    sim.set_transform(VolumeTransform::new(Vec3::new(3.0, 0.0, 0.0), 0.5));

    let background = ColorBuffer::filled(WIDTH, HEIGHT, Vec4::new(0.1, 0.1, 0.1, 0.5));
    let image = sim.render_frame(&camera(), &background).unwrap();
    assert_eq!(image.get(WIDTH / 2, HEIGHT / 2), background.get(WIDTH / 2, HEIGHT / 2));
}

#[test]
fn test_debug_modes_render() {
    let mut sim = simulation(16);
    sim.inject_impulse(Vec3::new(8.0, 8.0, 8.0), 5.0, 3.0).unwrap();
    sim.advance(1.0 / 60.0).unwrap();
    let background = ColorBuffer::filled(WIDTH, HEIGHT, Vec4::zeros());

    for mode in [RenderMode::Pressure, RenderMode::Velocity, RenderMode::Divergence] {
        sim.set_render_mode(mode);
        let image = sim.render_frame(&camera(), &background).unwrap();
        let centre = image.get(WIDTH / 2, HEIGHT / 2);
        assert!(centre.iter().all(|c| c.is_finite()), "{mode:?}");
        assert!(centre.w >= 0.0 && centre.w <= 1.0, "{mode:?}");
    }
}
