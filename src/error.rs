//! Error types for the acoustic simulator.

use thiserror::Error;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors that can occur while setting up or running a simulation session.
#[derive(Error, Debug)]
pub enum SimError {
    /// A tunable is outside its accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The chosen constants violate the CFL condition of the 5-point stencil.
    #[error("Unstable configuration: Courant number {courant:.4} exceeds {limit:.4} (c={wave_speed} m/s, dt={time_step} s, dx={spatial_step} m)")]
    Unstable {
        courant: f32,
        limit: f32,
        wave_speed: f32,
        time_step: f32,
        spatial_step: f32,
    },

    /// An obstacle mask does not match the grid it is attached to.
    #[error("Mask shape {got:?} does not match grid {expected:?}")]
    MaskShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// The pressure field picked up non-finite values.
    #[error("Field diverged at frame {frame}: non-finite pressure values")]
    Diverged { frame: u64 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Failed to parse TOML config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Floor-plan image could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl SimError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
