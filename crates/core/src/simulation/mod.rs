//! Frame orchestration
//!
//! [`SmokeSimulation`] owns a solver backend, the per-frame kernel pipeline,
//! the sampling textures and the run state. Hosts drive it with
//! [`SmokeSimulation::advance`] once per frame and draw with
//! [`SmokeSimulation::render_frame`].

mod smoke_simulation;

pub use smoke_simulation::{FrameReport, RunState, SmokeSimulation};
