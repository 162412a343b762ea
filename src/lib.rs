//! Real-time 2D acoustic wave simulation over a floor plan.
//!
//! A floor-plan image becomes an [`ObstacleMask`]; an [`Orchestrator`] runs
//! the FDTD [`Stepper`] several times per frame, injects click impulses and
//! renders the pressure field into an RGB buffer for display.

pub mod config;
pub mod error;
pub mod excitation;
pub mod mask;
pub mod orchestrator;
pub mod render;
pub mod state;
pub mod stepper;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use excitation::excite;
pub use mask::ObstacleMask;
pub use orchestrator::{InputEvent, InputSource, Key, LoopState, MouseButton, Orchestrator};
pub use render::{color_for, render, Renderer};
pub use state::{Rgb, SimulationState};
pub use stepper::Stepper;

/// Install the `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` overrides the default of `info` for this crate.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("floorplan_acoustics=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
