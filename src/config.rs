//! Simulation constants and their validation.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// CFL bound for the explicit 5-point stencil in two dimensions: `c·dt/dx <= 1/sqrt(2)`.
pub const CFL_LIMIT_2D: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// The recognized tunable set of a simulation session.
///
/// Every field has a default, so a TOML file only needs to name the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid size as `[width, height]` in cells.
    pub resolution: (usize, usize),
    /// Speed of sound (m/s).
    pub wave_speed: f32,
    /// Cell size (m).
    pub spatial_step: f32,
    /// Time step (s).
    pub time_step: f32,
    /// Per-step attenuation factor in (0, 1].
    pub damping: f32,
    /// Visual amplification applied before color mapping.
    pub visual_gain: f32,
    /// Stepper invocations per rendered frame.
    pub substeps_per_frame: usize,
    /// Half-width of the square excited by a click, in cells.
    pub excitation_radius: usize,
    /// Pressure written into excited cells.
    pub excitation_value: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            resolution: (600, 600),
            wave_speed: 340.0,
            spatial_step: 0.15,
            time_step: 0.00025,
            damping: 0.995,
            visual_gain: 5.0,
            substeps_per_frame: 20,
            excitation_radius: 3,
            excitation_value: 10.0,
        }
    }
}

impl SimConfig {
    /// Default constants on a different grid size.
    pub fn with_resolution(width: usize, height: usize) -> Self {
        Self {
            resolution: (width, height),
            ..Self::default()
        }
    }

    pub fn width(&self) -> usize {
        self.resolution.0
    }

    pub fn height(&self) -> usize {
        self.resolution.1
    }

    /// Courant number `c·dt/dx`.
    pub fn courant_number(&self) -> f32 {
        self.wave_speed * self.time_step / self.spatial_step
    }

    /// Squared Courant number, the stencil coefficient.
    pub fn courant_sq(&self) -> f32 {
        self.courant_number().powi(2)
    }

    /// Load configuration from a TOML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject constants the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.resolution;
        if width < 3 || height < 3 {
            return Err(SimError::invalid_config(format!(
                "resolution must be at least 3x3 to have interior cells, got {}x{}",
                width, height
            )));
        }
        for (name, value) in [
            ("wave_speed", self.wave_speed),
            ("spatial_step", self.spatial_step),
            ("time_step", self.time_step),
            ("visual_gain", self.visual_gain),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(SimError::invalid_config(format!(
                "damping must be in (0, 1], got {}",
                self.damping
            )));
        }
        if self.substeps_per_frame == 0 {
            return Err(SimError::invalid_config(
                "substeps_per_frame must be at least 1",
            ));
        }
        if !self.excitation_value.is_finite() {
            return Err(SimError::invalid_config(format!(
                "excitation_value must be finite, got {}",
                self.excitation_value
            )));
        }
        if self.excitation_radius >= width.min(height) {
            return Err(SimError::invalid_config(format!(
                "excitation_radius must be smaller than the grid ({}x{}), got {}",
                width, height, self.excitation_radius
            )));
        }

        let courant = self.courant_number();
        if courant > CFL_LIMIT_2D {
            return Err(SimError::Unstable {
                courant,
                limit: CFL_LIMIT_2D,
                wave_speed: self.wave_speed,
                time_step: self.time_step,
                spatial_step: self.spatial_step,
            });
        }
        Ok(())
    }

    /// Log the session constants.
    pub fn log_summary(&self) {
        info!(
            "Grid {}x{} ({:.1} x {:.1} m), c={} m/s, dx={} m, dt={} s, Courant={:.3}",
            self.width(),
            self.height(),
            self.width() as f32 * self.spatial_step,
            self.height() as f32 * self.spatial_step,
            self.wave_speed,
            self.spatial_step,
            self.time_step,
            self.courant_number()
        );
        info!(
            "damping={}, gain={}, {} substeps/frame, excitation {} at radius {}",
            self.damping,
            self.visual_gain,
            self.substeps_per_frame,
            self.excitation_value,
            self.excitation_radius
        );
    }
}
