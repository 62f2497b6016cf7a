use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use smoke_sim_core::{
    CameraPose, ColorBuffer, QualityPreset, RenderConfig, RenderMode, SmokeSimulation,
    SolverConfig, Vec3, Vec4,
};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Headless smoke simulation demo
#[derive(Parser, Debug)]
#[command(name = "smoke-sim-demo")]
#[command(about = "Runs the smoke solver without a window and writes PNG frames", long_about = None)]
struct Args {
    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 120)]
    frames: u32,

    /// Timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Quality preset (overrides grid size and iteration counts from the config file)
    #[arg(short, long, value_enum)]
    quality: Option<Quality>,

    /// JSON file with `solver` and `render` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What to render
    #[arg(short, long, value_enum, default_value_t = Mode::Volumetric)]
    mode: Mode,

    /// Image width in pixels
    #[arg(long, default_value_t = 320)]
    width: usize,

    /// Image height in pixels
    #[arg(long, default_value_t = 240)]
    height: usize,

    /// Inject a new puff every N frames (0 = only once)
    #[arg(long, default_value_t = 20)]
    impulse_interval: u32,

    /// Impulse radius in cells
    #[arg(long, default_value_t = 4.0)]
    radius: f32,

    /// Impulse strength
    #[arg(long, default_value_t = 2.0)]
    strength: f32,

    /// Report interval in frames
    #[arg(short, long, default_value_t = 10)]
    report_interval: u32,

    /// Directory for rendered frames (no images are written when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write an image every N frames
    #[arg(long, default_value_t = 30)]
    image_interval: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Quality {
    Low,
    Medium,
    High,
    Ultra,
}

impl From<Quality> for QualityPreset {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Low => QualityPreset::Low,
            Quality::Medium => QualityPreset::Medium,
            Quality::High => QualityPreset::High,
            Quality::Ultra => QualityPreset::Ultra,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Volumetric,
    Pressure,
    Velocity,
    Divergence,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Volumetric => RenderMode::Volumetric,
            Mode::Pressure => RenderMode::Pressure,
            Mode::Velocity => RenderMode::Velocity,
            Mode::Divergence => RenderMode::Divergence,
        }
    }
}

/// Contents of the `--config` file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    solver: SolverConfig,
    render: RenderConfig,
}

fn load_config(path: Option<&Path>) -> Result<DemoConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let config = serde_json::from_str(&text)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        None => Ok(DemoConfig::default()),
    }
}

fn save_png(image: &ColorBuffer, path: &Path) -> Result<(), Box<dyn Error>> {
    let width = u32::try_from(image.width())?;
    let height = u32::try_from(image.height())?;
    let buffer = image::RgbaImage::from_raw(width, height, image.to_rgba8())
        .ok_or("pixel buffer does not match image size")?;
    buffer.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(quality) = args.quality {
        config.solver = QualityPreset::from(quality).apply(config.solver);
    }
    config.render.mode = args.mode.into();

    println!("=== Smoke Simulation Demo ===\n");
    let mut sim = SmokeSimulation::new(config.solver, config.render, args.width, args.height)?;
    let n = sim.solver_config().grid_size;
    println!(
        "Grid: {}^3, diffusion iterations: {}, pressure iterations: {}, GPU: {}",
        n,
        sim.solver_config().diffusion_iterations,
        sim.solver_config().pressure_iterations,
        sim.is_gpu_accelerated()
    );

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)?;
    }

    let aspect = args.width as f32 / args.height.max(1) as f32;
    let camera = CameraPose::look_at(
        Vec3::new(0.0, 0.5, 3.5),
        Vec3::zeros(),
        Vec3::y(),
        std::f32::consts::FRAC_PI_3,
        aspect,
    );
    let background = ColorBuffer::filled(args.width, args.height, Vec4::new(0.05, 0.05, 0.08, 1.0));

    // Puffs rise from near the floor of the cube
    let source = Vec3::new(n as f32 * 0.5, n as f32 * 0.2, n as f32 * 0.5);

    println!("\nFrame | Max density | |div| before | |div| after | Solver(ms)");
    println!("------|-------------|--------------|-------------|-----------");

    for frame in 0..args.frames {
        let inject = if args.impulse_interval == 0 {
            frame == 0
        } else {
            frame % args.impulse_interval == 0
        };
        if inject {
            sim.inject_impulse(source, args.radius, args.strength)?;
        }

        let report = sim.advance(args.dt)?;

        if args.report_interval > 0 && report.frame % u64::from(args.report_interval) == 0 {
            println!(
                "{:5} | {:11.4} | {:12.6} | {:11.6} | {:9.2}",
                report.frame,
                report.max_density,
                report.divergence_before.unwrap_or(0.0),
                report.divergence_after.unwrap_or(0.0),
                report.timings.total_ms()
            );
        }

        if let Some(dir) = &args.output {
            if args.image_interval > 0 && report.frame % u64::from(args.image_interval) == 0 {
                let image = sim.render_frame(&camera, &background)?;
                let path = dir.join(format!("frame_{:05}.png", report.frame));
                save_png(&image, &path)?;
                info!(path = %path.display(), "Wrote frame");
            }
        }
    }

    println!("\n=== Simulation Complete ===");
    println!("Frames: {}", sim.frame());
    println!("Average frame time: {:.2} ms", sim.frame_timer().average_ms());
    Ok(())
}
