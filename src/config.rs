//! Pipeline configuration and validation.

use crate::dsp::window::WindowKind;
use crate::error::ConfigError;
use crate::palette::Palette;
use serde::{Deserialize, Serialize};

/// Sample rate (Hz) assumed when the host supplies none.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Analysis and display parameters for the spectrogram pipeline.
///
/// Validated as a whole at construction and on every reconfiguration;
/// invalid values are rejected rather than silently clamped so a caller
/// bug cannot hide behind a plausible-looking picture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Sample rate of the incoming audio in Hz.
    pub sample_rate: f32,
    /// Samples per analysis frame. Must be even.
    pub frame_size: usize,
    /// Fraction of a frame shared with its successor, in [0, 1).
    pub overlap_ratio: f32,
    /// Maximum retained backlog of unconsumed samples.
    pub buffer_capacity: usize,
    /// Highest frequency mapped onto the display, in Hz.
    pub max_display_hz: f32,
    /// Lower edge of the dB normalization range.
    pub min_db: f32,
    /// Upper edge of the dB normalization range.
    pub max_db: f32,
    /// Convert magnitudes to dB before normalizing.
    pub log_scale: bool,
    pub palette: Palette,
    pub window: WindowKind,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: 1024,
            overlap_ratio: 0.5,
            buffer_capacity: 32 * 1024,
            max_display_hz: 12_000.0,
            min_db: 0.0,
            max_db: 45.0,
            log_scale: true,
            palette: Palette::Heat,
            window: WindowKind::Hamming,
        }
    }
}

impl SpectrogramConfig {
    /// Hop between successive frames, never less than one sample.
    pub fn hop(&self) -> usize {
        let hop = (self.frame_size as f32 * (1.0 - self.overlap_ratio)).round() as usize;
        hop.max(1)
    }

    /// Number of frequency bins produced per frame.
    pub fn bins(&self) -> usize {
        self.frame_size / 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_size == 0 || self.frame_size % 2 != 0 {
            return Err(ConfigError::InvalidFrameSize(self.frame_size));
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(ConfigError::InvalidOverlap(self.overlap_ratio));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.buffer_capacity < self.frame_size {
            return Err(ConfigError::BufferTooSmall {
                capacity: self.buffer_capacity,
                frame_size: self.frame_size,
            });
        }
        let nyquist = self.sample_rate * 0.5;
        if !(self.max_display_hz > 0.0 && self.max_display_hz <= nyquist) {
            return Err(ConfigError::InvalidDisplayFrequency {
                max_display_hz: self.max_display_hz,
                nyquist,
            });
        }
        if !(self.min_db < self.max_db) {
            return Err(ConfigError::EmptyDbRange {
                min_db: self.min_db,
                max_db: self.max_db,
            });
        }
        Ok(())
    }
}
