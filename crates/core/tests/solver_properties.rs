//! Solver Property Suite
//!
//! Frame-level invariants of the CPU backend:
//! - density and temperature stay in [0, 1]
//! - projection reduces divergence
//! - velocity is zero on every boundary face after a frame
//! - a zero-length frame only applies the decay factors
//! - impulses only touch cells inside their radius

mod common;

use approx::assert_relative_eq;
use smoke_sim_core::grid::FieldSet;
use smoke_sim_core::solver::{
    mean_abs_divergence, CpuSmokeSolver, FrameParams, Impulse, Kernel, Pipeline, SmokeSolver,
    SolverConfig,
};
use smoke_sim_core::{FieldKind, GridIndex, Vec3};

const DT: f32 = 1.0 / 60.0;

fn config(n: usize) -> SolverConfig {
    SolverConfig {
        grid_size: n,
        ..SolverConfig::default()
    }
}

fn new_solver(config: &SolverConfig) -> CpuSmokeSolver {
    common::init_test_logging();
    CpuSmokeSolver::new(config).unwrap()
}

fn run_frame(solver: &mut CpuSmokeSolver, pipeline: &Pipeline, params: &FrameParams) {
    for kernel in pipeline.kernels() {
        solver.dispatch(kernel, params);
    }
}

fn inject(solver: &mut CpuSmokeSolver, params: &FrameParams, position: Vec3, radius: f32, strength: f32) {
    let impulse = Impulse::new(position, radius, strength).unwrap();
    solver.dispatch(&Kernel::Impulse(impulse), params);
}

fn snapshot(fields: &FieldSet) -> (Vec<Vec3>, Vec<f32>, Vec<f32>, Vec<f32>) {
    (
        fields.velocity.read().to_vec(),
        fields.density.read().to_vec(),
        fields.temperature.read().to_vec(),
        fields.pressure.read().to_vec(),
    )
}

#[test]
fn test_scalars_stay_bounded_under_repeated_injection() {
    let config = config(16);
    let mut solver = new_solver(&config);
    let pipeline = Pipeline::build(&config);
    let params = FrameParams { dt: DT, config };

    for frame in 0..30 {
        if frame % 3 == 0 {
            let offset = (frame % 5) as f32;
            inject(&mut solver, &params, Vec3::new(5.0 + offset, 4.0, 8.0), 5.0, 40.0);
        }
        run_frame(&mut solver, &pipeline, &params);

        for kind in [FieldKind::Density, FieldKind::Temperature] {
            let values = solver.read_scalar(kind).unwrap();
            assert!(
                values.iter().all(|v| (0.0..=1.0).contains(v)),
                "{kind:?} left [0, 1] at frame {frame}"
            );
        }
    }
}

/// Mean |∇·v| before and after one projection of a fresh impulse
fn project_once(iterations: u32) -> (f32, f32) {
    let config = SolverConfig {
        pressure_iterations: iterations,
        ..config(16)
    };
    let mut solver = new_solver(&config);
    let params = FrameParams { dt: DT, config };
    inject(&mut solver, &params, Vec3::new(8.0, 8.0, 8.0), 5.0, 4.0);

    let grid = GridIndex::new(16);
    let before = mean_abs_divergence(&solver.read_velocity(), grid);

    solver.dispatch(&Kernel::Divergence, &params);
    for _ in 0..iterations {
        solver.dispatch(&Kernel::PressureJacobi, &params);
    }
    solver.dispatch(&Kernel::GradientSubtract, &params);
    solver.dispatch(&Kernel::PressureBoundary, &params);

    (before, mean_abs_divergence(&solver.read_velocity(), grid))
}

#[test]
fn test_projection_reduces_divergence() {
    for iterations in [1, 2, 60] {
        let (before, after) = project_once(iterations);
        assert!(before > 0.0);
        assert!(
            after < before,
            "M = {iterations}: divergence {before} -> {after}"
        );
    }
}

#[test]
fn test_velocity_boundary_is_zero_after_frame() {
    let config = config(12);
    let mut solver = new_solver(&config);
    let pipeline = Pipeline::build(&config);
    let params = FrameParams { dt: DT, config };
    inject(&mut solver, &params, Vec3::new(6.0, 3.0, 6.0), 6.0, 10.0);

    for _ in 0..3 {
        run_frame(&mut solver, &pipeline, &params);
    }

    let grid = GridIndex::new(12);
    let velocity = solver.read_velocity();
    for (idx, v) in velocity.iter().enumerate() {
        let (x, y, z) = grid.coords(idx);
        if grid.is_boundary(x, y, z) {
            assert_eq!(*v, Vec3::zeros(), "boundary cell ({x}, {y}, {z}) moved");
        }
    }
}

#[test]
fn test_zero_dt_frame_only_decays() {
    let config = config(12);
    let mut solver = new_solver(&config);
    let pipeline = Pipeline::build(&config);
    let warmup = FrameParams { dt: DT, config };
    inject(&mut solver, &warmup, Vec3::new(6.0, 6.0, 6.0), 4.0, 3.0);
    run_frame(&mut solver, &pipeline, &warmup);

    let density = solver.read_scalar(FieldKind::Density).unwrap().into_owned();
    let temperature = solver.read_scalar(FieldKind::Temperature).unwrap().into_owned();

    let still = FrameParams { dt: 0.0, config };
    run_frame(&mut solver, &pipeline, &still);

    let grid = GridIndex::new(12);
    let density_after = solver.read_scalar(FieldKind::Density).unwrap();
    let temperature_after = solver.read_scalar(FieldKind::Temperature).unwrap();
    for idx in 0..grid.cell_count() {
        let (x, y, z) = grid.coords(idx);
        // Mirror faces copy interior values from before the decay
        if grid.is_boundary(x, y, z) {
            continue;
        }
        assert_relative_eq!(
            density_after[idx],
            density[idx] * config.density_decay,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            temperature_after[idx],
            temperature[idx] * config.temperature_decay,
            epsilon = 1e-6
        );
    }
}

#[test]
fn test_impulse_only_touches_cells_inside_radius() {
    let config = config(16);
    let mut solver = new_solver(&config);
    let pipeline = Pipeline::build(&config);
    let params = FrameParams { dt: DT, config };

    // Give every field some structure first
    inject(&mut solver, &params, Vec3::new(4.0, 4.0, 4.0), 4.0, 6.0);
    run_frame(&mut solver, &pipeline, &params);

    let before = snapshot(solver.fields());
    let centre = Vec3::new(9.0, 8.0, 10.0);
    let radius = 3.5;
    inject(&mut solver, &params, centre, radius, 5.0);
    let after = snapshot(solver.fields());

    let grid = GridIndex::new(16);
    let mut touched = 0;
    for idx in 0..grid.cell_count() {
        let (x, y, z) = grid.coords(idx);
        let distance = (Vec3::new(x as f32, y as f32, z as f32) - centre).norm();
        if distance >= radius {
            assert_eq!(before.0[idx], after.0[idx]);
            assert_eq!(before.1[idx], after.1[idx]);
            assert_eq!(before.2[idx], after.2[idx]);
            assert_eq!(before.3[idx], after.3[idx]);
        } else if before.0[idx] != after.0[idx] {
            touched += 1;
        }
    }
    assert!(touched > 0);
}

#[test]
fn test_centre_injection_on_32_grid() {
    let config = config(32);
    let mut solver = new_solver(&config);
    let pipeline = Pipeline::build(&config);
    let params = FrameParams { dt: DT, config };
    let centre = Vec3::new(16.0, 16.0, 16.0);
    let radius = 5.0;
    let strength = 5.0;

    let before = snapshot(solver.fields());
    inject(&mut solver, &params, centre, radius, strength);

    let fields = solver.fields();
    assert_relative_eq!(
        fields.density.get(16, 16, 16),
        (3.0 * config.density_factor).min(1.0),
        epsilon = 1e-6
    );
    assert_relative_eq!(
        fields.temperature.get(16, 16, 16),
        (3.0 * config.temperature_factor).min(1.0),
        epsilon = 1e-6
    );
    assert_relative_eq!(
        fields.pressure.get(16, 16, 16),
        config.pressure_factor.min(1.0),
        epsilon = 1e-6
    );

    // The centre has no outward direction; it still gets full-strength velocity
    let centre_velocity = fields.velocity.get(16, 16, 16);
    assert_relative_eq!(centre_velocity.norm(), strength, epsilon = 1e-4);

    // Neighbours point away from the centre
    assert!(fields.velocity.get(17, 16, 16).x > 0.0);
    assert!(fields.velocity.get(16, 15, 16).y < 0.0);

    // Nothing outside the radius changed
    let after = snapshot(fields);
    let grid = GridIndex::new(32);
    for idx in 0..grid.cell_count() {
        let (x, y, z) = grid.coords(idx);
        let distance = (Vec3::new(x as f32, y as f32, z as f32) - centre).norm();
        if distance >= radius {
            assert_eq!(before.0[idx], after.0[idx]);
            assert_eq!(before.1[idx], after.1[idx]);
            assert_eq!(before.2[idx], after.2[idx]);
            assert_eq!(before.3[idx], after.3[idx]);
        }
    }

    for frame in 0..20 {
        run_frame(&mut solver, &pipeline, &params);
        for kind in [FieldKind::Density, FieldKind::Temperature] {
            let values = solver.read_scalar(kind).unwrap();
            assert!(
                values.iter().all(|v| (0.0..=1.0).contains(v)),
                "{kind:?} left [0, 1] at frame {frame}"
            );
        }
    }
}
