//! Smoke simulation driven by a `SmokeSolver` backend

use crate::core_types::{GridIndex, Vec3};
use crate::error::{Result, SmokeError};
use crate::grid::FieldKind;
use crate::render::{
    render_volume, CameraPose, ColorBuffer, RenderConfig, RenderMode, VolumeTextures,
    VolumeTransform,
};
use crate::solver::{
    create_smoke_solver, mean_abs_divergence, FrameParams, FrameTimer, Impulse, Kernel,
    PassTimings, Pipeline, SmokeSolver, SolverConfig,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Whether frames execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Every call to `advance` runs the pipeline
    Running,
    /// No passes run
    Paused,
    /// Paused, but the next `advance` runs exactly one frame
    StepPending,
}

/// Statistics for one call to [`SmokeSimulation::advance`]
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Number of executed frames so far, including this one
    pub frame: u64,
    /// `false` when the simulation was paused and nothing ran
    pub executed: bool,
    /// Mean |∇·v| after advection, before projection
    pub divergence_before: Option<f32>,
    /// Mean |∇·v| after projection
    ///
    /// With few pressure iterations this can exceed `divergence_before`: the
    /// warm-started pressure and the injector's pressure bump are both
    /// subtracted before the solve has caught up with the new divergence.
    pub divergence_after: Option<f32>,
    /// Largest density value after the frame
    pub max_density: f32,
    /// Per-kernel wall-clock timings
    pub timings: PassTimings,
}

/// Interactive smoke simulation with a volumetric renderer
pub struct SmokeSimulation {
    solver: Box<dyn SmokeSolver>,
    solver_config: SolverConfig,
    render_config: RenderConfig,
    pipeline: Pipeline,
    textures: VolumeTextures,
    transform: VolumeTransform,
    pending_impulse: Option<Impulse>,
    state: RunState,
    frame: u64,
    diagnostics: bool,
    frame_timer: FrameTimer,
    viewport: (usize, usize),
}

impl SmokeSimulation {
    /// Create a simulation with automatic backend selection
    ///
    /// # Arguments
    ///
    /// * `solver_config` - Grid size and physical parameters
    /// * `render_config` - Optical parameters and render mode
    /// * `width`, `height` - Size of the images passed to [`Self::render_frame`]
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] if either configuration is out of
    /// range, or [`SmokeError::Allocation`] if the fields cannot be allocated.
    pub fn new(
        solver_config: SolverConfig,
        render_config: RenderConfig,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        solver_config.validate()?;
        render_config.validate()?;
        let solver = create_smoke_solver(&solver_config)?;
        Ok(Self::with_solver(solver, solver_config, render_config, width, height))
    }

    /// Create a simulation around an existing backend
    ///
    /// The configurations are assumed to be validated and to match the
    /// solver's grid size.
    pub fn with_solver(
        solver: Box<dyn SmokeSolver>,
        solver_config: SolverConfig,
        render_config: RenderConfig,
        width: usize,
        height: usize,
    ) -> Self {
        let n = solver.grid_size();
        info!(
            grid_size = n,
            gpu = solver.is_gpu_accelerated(),
            width,
            height,
            "Smoke simulation initialized"
        );
        Self {
            solver,
            solver_config,
            render_config,
            pipeline: Pipeline::build(&solver_config),
            textures: VolumeTextures::empty(n),
            transform: VolumeTransform::default(),
            pending_impulse: None,
            state: RunState::Running,
            frame: 0,
            diagnostics: true,
            frame_timer: FrameTimer::new(),
            viewport: (width, height),
        }
    }

    /// Queue an impulse for the next executed frame
    ///
    /// Only one impulse is kept; a later call replaces an earlier one that has
    /// not been applied yet.
    ///
    /// # Arguments
    ///
    /// * `position` - Centre in grid cell units
    /// * `radius` - Falloff radius in cells
    /// * `strength` - Outward velocity at the centre
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidImpulse`] for a non-finite position or
    /// strength, or a radius that is not positive.
    pub fn inject_impulse(&mut self, position: Vec3, radius: f32, strength: f32) -> Result<()> {
        match Impulse::new(position, radius, strength) {
            Ok(impulse) => {
                if self.pending_impulse.replace(impulse).is_some() {
                    debug!("Pending impulse replaced before it was applied");
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Impulse rejected");
                Err(err)
            }
        }
    }

    /// Stop running frames
    pub fn pause(&mut self) {
        self.state = RunState::Paused;
    }

    /// Run a frame on every call to `advance`
    pub fn resume(&mut self) {
        self.state = RunState::Running;
    }

    /// Run exactly one more frame, then stay paused
    pub fn step_once(&mut self) {
        self.state = RunState::StepPending;
    }

    /// Check if frames are suspended
    pub fn is_paused(&self) -> bool {
        self.state != RunState::Running
    }

    /// Current run state
    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Enable or disable the divergence readback in [`FrameReport`]
    pub fn set_diagnostics(&mut self, enabled: bool) {
        self.diagnostics = enabled;
    }

    /// Switch between the volumetric view and the debug views
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_config.mode = mode;
    }

    /// Replace the solver configuration
    ///
    /// A new grid size reallocates every field; on failure the previous grid,
    /// its contents and the previous configuration are kept. A new `seed`
    /// restarts the impulse tie-break sequence.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] if `config` is out of range, or
    /// [`SmokeError::Allocation`] if a resize fails.
    pub fn set_solver_config(&mut self, config: SolverConfig) -> Result<()> {
        if let Err(err) = config.validate() {
            warn!(error = %err, "Solver configuration rejected");
            return Err(err);
        }
        if config.grid_size != self.solver.grid_size() {
            self.resize_solver(config.grid_size)?;
        }
        if config.seed != self.solver_config.seed {
            self.solver.reseed(config.seed);
        }
        if !self.pipeline.matches(&config) {
            self.pipeline = Pipeline::build(&config);
            debug!(kernels = self.pipeline.len(), "Pipeline rebuilt");
        }
        self.solver_config = config;
        Ok(())
    }

    /// Replace the renderer configuration
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] if `config` is out of range.
    pub fn set_render_config(&mut self, config: RenderConfig) -> Result<()> {
        if let Err(err) = config.validate() {
            warn!(error = %err, "Render configuration rejected");
            return Err(err);
        }
        self.render_config = config;
        Ok(())
    }

    /// Change the grid size, keeping every other solver parameter
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] for a size outside the supported
    /// range, or [`SmokeError::Allocation`] if the new fields cannot be allocated.
    pub fn resize(&mut self, grid_size: usize) -> Result<()> {
        self.set_solver_config(self.solver_config.with_grid_size(grid_size))
    }

    /// Change the size of the images passed to [`Self::render_frame`]
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.viewport = (width, height);
    }

    /// Place the simulation cube in world space
    pub fn set_transform(&mut self, transform: VolumeTransform) {
        self.transform = transform;
    }

    /// Zero every field, drop any pending impulse and restart the seeded
    /// tie-break sequence
    pub fn reset(&mut self) {
        self.solver.reset();
        self.solver.reseed(self.solver_config.seed);
        self.pending_impulse = None;
        self.textures.refresh(self.solver.as_ref());
        info!("Smoke simulation reset");
    }

    /// Run one frame of the solver
    ///
    /// When paused nothing is dispatched and the report has `executed: false`.
    /// Otherwise the pending impulse (if any) is applied, followed by every
    /// kernel of the pipeline, and the sampling textures are refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidConfig`] if `dt` is negative or not finite.
    pub fn advance(&mut self, dt: f32) -> Result<FrameReport> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SmokeError::invalid_config(
                "dt",
                format!("must be finite and non-negative, got {dt}"),
            ));
        }

        match self.state {
            RunState::Paused => {
                return Ok(FrameReport {
                    frame: self.frame,
                    executed: false,
                    divergence_before: None,
                    divergence_after: None,
                    max_density: self.max_density(),
                    timings: PassTimings::new(),
                });
            }
            RunState::StepPending => self.state = RunState::Paused,
            RunState::Running => {}
        }

        let frame_start = Instant::now();
        let params = FrameParams {
            dt,
            config: self.solver_config,
        };
        let mut timings = PassTimings::new();
        let mut divergence_before = None;

        if let Some(impulse) = self.pending_impulse.take() {
            self.run_kernel(&Kernel::Impulse(impulse), &params, &mut timings);
        }
        for kernel in self.pipeline.kernels() {
            if self.diagnostics && matches!(kernel, Kernel::Divergence) {
                divergence_before = Some(self.mean_divergence());
            }
            let start = Instant::now();
            self.solver.dispatch(kernel, &params);
            timings.record(kernel.label(), start.elapsed().as_secs_f64() * 1000.0);
        }
        let divergence_after = self.diagnostics.then(|| self.mean_divergence());

        self.textures.refresh(self.solver.as_ref());
        self.frame += 1;
        let elapsed_ms = frame_start.elapsed().as_secs_f64() * 1000.0;
        self.frame_timer.record(elapsed_ms);

        let report = FrameReport {
            frame: self.frame,
            executed: true,
            divergence_before,
            divergence_after,
            max_density: self.max_density(),
            timings,
        };
        debug!(
            frame = report.frame,
            dt,
            elapsed_ms,
            dispatches = report.timings.dispatch_count(),
            max_density = report.max_density,
            "Frame complete"
        );
        Ok(report)
    }

    /// Render the volume over the previous frame
    ///
    /// # Arguments
    ///
    /// * `camera` - View and projection for this frame
    /// * `background` - Snapshot of the previous frame, sized to the viewport
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidDimensions`] if `background` does not match
    /// the viewport, or [`SmokeError::InvalidConfig`] if a camera matrix is singular.
    pub fn render_frame(&self, camera: &CameraPose, background: &ColorBuffer) -> Result<ColorBuffer> {
        let (width, height) = self.viewport;
        if background.width() != width || background.height() != height {
            return Err(SmokeError::InvalidDimensions {
                expected_width: width,
                expected_height: height,
                width: background.width(),
                height: background.height(),
                len: background.pixels().len(),
            });
        }
        render_volume(
            camera,
            background,
            &self.textures,
            &self.transform,
            &self.render_config,
        )
    }

    /// Backend in use
    pub fn solver(&self) -> &dyn SmokeSolver {
        self.solver.as_ref()
    }

    /// Current solver configuration
    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }

    /// Current renderer configuration
    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    /// Per-frame kernel list
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Snapshots used by the renderer
    pub fn textures(&self) -> &VolumeTextures {
        &self.textures
    }

    /// World placement of the simulation cube
    pub fn transform(&self) -> &VolumeTransform {
        &self.transform
    }

    /// Number of executed frames
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Impulse waiting for the next executed frame
    pub fn pending_impulse(&self) -> Option<&Impulse> {
        self.pending_impulse.as_ref()
    }

    /// Wall-clock frame timings
    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }

    /// Check if the GPU backend is being used
    pub fn is_gpu_accelerated(&self) -> bool {
        self.solver.is_gpu_accelerated()
    }

    // ====== Private Methods ======

    fn run_kernel(&mut self, kernel: &Kernel, params: &FrameParams, timings: &mut PassTimings) {
        let start = Instant::now();
        self.solver.dispatch(kernel, params);
        timings.record(kernel.label(), start.elapsed().as_secs_f64() * 1000.0);
    }

    fn resize_solver(&mut self, grid_size: usize) -> Result<()> {
        let previous = self.solver.grid_size();
        self.solver.resize(grid_size)?;
        self.textures = VolumeTextures::empty(grid_size);
        info!(from = previous, to = grid_size, "Simulation grid resized");
        Ok(())
    }

    fn mean_divergence(&self) -> f32 {
        let n = self.solver.grid_size();
        mean_abs_divergence(&self.solver.read_velocity(), GridIndex::new(n))
    }

    fn max_density(&self) -> f32 {
        self.solver
            .read_scalar(FieldKind::Density)
            .map_or(0.0, |density| density.iter().copied().fold(0.0, f32::max))
    }
}
