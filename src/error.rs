//! Configuration rejection errors.
//!
//! Only invalid configuration surfaces as an error. Starvation (not enough
//! buffered samples for a frame) and numeric edge cases (zero magnitude
//! before log scaling) are expected steady-state conditions handled inline.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("frame size must be a positive even number, got {0}")]
    InvalidFrameSize(usize),

    #[error("overlap ratio must lie in [0, 1), got {0}")]
    InvalidOverlap(f32),

    #[error("sample rate must be a positive finite number, got {0}")]
    InvalidSampleRate(f32),

    #[error("buffer capacity {capacity} cannot hold a {frame_size}-sample frame")]
    BufferTooSmall { capacity: usize, frame_size: usize },

    #[error("display frequency cap {max_display_hz} Hz must lie in (0, {nyquist}] Hz")]
    InvalidDisplayFrequency { max_display_hz: f32, nyquist: f32 },

    #[error("dB range is empty: min {min_db} is not below max {max_db}")]
    EmptyDbRange { min_db: f32, max_db: f32 },

    #[error("display dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("tick rate of 0 Hz would never run the consumer")]
    InvalidTickRate,
}
