//! Per-frame driver: input, substeps, render, termination.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::excitation::excite;
use crate::mask::ObstacleMask;
use crate::render::Renderer;
use crate::state::{Rgb, SimulationState};
use crate::stepper::Stepper;
use ndarray::Array2;
use std::collections::VecDeque;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    /// Silence the field, keeping the floor plan.
    Reset,
}

/// Input delivered by the display collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse press at a normalized position, `x` rightwards and `y` downwards in [0, 1].
    Press {
        button: MouseButton,
        position: (f32, f32),
    },
    Key(Key),
}

/// Non-blocking source of input events, drained once per frame.
pub trait InputSource {
    fn poll_event(&mut self) -> Option<InputEvent>;
}

impl InputSource for VecDeque<InputEvent> {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Owns the session state and advances it one rendered frame at a time.
pub struct Orchestrator {
    config: SimConfig,
    state: SimulationState,
    stepper: Stepper,
    renderer: Renderer,
    loop_state: LoopState,
    frame: u64,
}

impl Orchestrator {
    /// Validate the constants and allocate the session fields.
    pub fn new(config: SimConfig, walls: ObstacleMask) -> Result<Self> {
        config.validate()?;
        let state = SimulationState::with_mask(config.width(), config.height(), walls)?;
        let stepper = Stepper::new(&config);
        let mut orchestrator = Self {
            renderer: Renderer::new(config.visual_gain),
            config,
            state,
            stepper,
            loop_state: LoopState::Running,
            frame: 0,
        };
        orchestrator.renderer.render(&mut orchestrator.state);
        Ok(orchestrator)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    pub fn pixels(&self) -> &Array2<Rgb> {
        self.state.pixels()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn is_running(&self) -> bool {
        self.loop_state == LoopState::Running
    }

    pub fn terminate(&mut self) {
        self.loop_state = LoopState::Terminated;
    }

    /// Apply one input event. Only called between stepper passes.
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Press {
                button: MouseButton::Primary,
                position: (x, y),
            } => {
                excite(
                    &mut self.state,
                    x,
                    y,
                    self.config.excitation_radius,
                    self.config.excitation_value,
                );
            }
            InputEvent::Press { button, .. } => debug!("Ignoring {:?} press", button),
            InputEvent::Key(Key::Escape) => {
                info!("Exit requested at frame {}", self.frame);
                self.terminate();
            }
            InputEvent::Key(Key::Reset) => {
                info!("Field reset at frame {}", self.frame);
                self.state.reset();
            }
        }
    }

    /// Run one frame: drain input, step `substeps_per_frame` times, render.
    ///
    /// Returns the loop state after the frame. A field that has gone
    /// non-finite terminates the loop with [`SimError::Diverged`] and is left
    /// as it was for inspection.
    pub fn run_frame(&mut self, input: &mut impl InputSource) -> Result<LoopState> {
        if !self.is_running() {
            return Ok(self.loop_state);
        }

        while let Some(event) = input.poll_event() {
            self.handle_event(event);
            if !self.is_running() {
                return Ok(self.loop_state);
            }
        }

        self.stepper
            .step_n(&mut self.state, self.config.substeps_per_frame);
        self.frame += 1;

        if !self.state.is_finite() {
            self.terminate();
            error!("Pressure field diverged at frame {}", self.frame);
            return Err(SimError::Diverged { frame: self.frame });
        }

        self.renderer.render(&mut self.state);
        Ok(self.loop_state)
    }
}
