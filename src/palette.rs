//! Magnitude-to-color mapping.
//!
//! Each palette is a pure, total function on the normalized range [0, 1];
//! inputs outside that range (including NaN from degenerate magnitudes) are
//! clamped, never rejected.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Additive offset applied before `log10` so silence stays finite.
pub const LOG_EPSILON: f32 = 1.0e-10;

/// A single display pixel, 8 bits per channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Closed set of magnitude-to-color mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Blue through cyan, green and yellow to white-hot, in five segments.
    #[default]
    Heat,
    /// Black to blue, then blue to white, in two segments.
    Blue,
    /// Linear black to white.
    Grayscale,
}

impl Palette {
    /// Map a normalized value in [0, 1] to a pixel.
    pub fn pixel(self, value: f32) -> Rgba {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self {
            Palette::Heat => heat(value),
            Palette::Blue => blue(value),
            Palette::Grayscale => grayscale(value),
        }
    }
}

/// Clamp `value` into `[min, max]` and rescale to [0, 1].
#[inline]
pub(crate) fn normalize(value: f32, min: f32, max: f32) -> f32 {
    (value.clamp(min, max) - min) / (max - min)
}

#[inline]
fn channel(value: f32) -> u8 {
    (255.0 * value) as u8
}

fn heat(value: f32) -> Rgba {
    if value < 1.0 / 5.0 {
        Rgba::new(0, 0, channel(normalize(value, 0.0, 1.0 / 5.0)), 255)
    } else if value < 2.0 / 5.0 {
        let c = channel(normalize(value, 1.0 / 5.0, 2.0 / 5.0));
        Rgba::new(0, c, 255 - c, 255)
    } else if value < 3.0 / 5.0 {
        Rgba::new(channel(normalize(value, 2.0 / 5.0, 3.0 / 5.0)), 255, 0, 255)
    } else if value < 4.0 / 5.0 {
        let c = channel(normalize(value, 3.0 / 5.0, 4.0 / 5.0));
        Rgba::new(255, 255 - c, 0, 255)
    } else {
        let c = channel(normalize(value, 4.0 / 5.0, 1.0));
        Rgba::new(255, c, c, 255)
    }
}

fn blue(value: f32) -> Rgba {
    if value < 0.5 {
        Rgba::new(0, 0, channel(normalize(value, 0.0, 0.5)), 255)
    } else {
        let c = channel(normalize(value, 0.5, 1.0));
        Rgba::new(c, c, 255, 255)
    }
}

fn grayscale(value: f32) -> Rgba {
    let c = channel(value);
    Rgba::new(c, c, c, 255)
}

/// Converts raw spectral magnitudes to pixels for one configuration.
///
/// Captures the palette, dB clamp range and log-scaling flag so the hot
/// column-building loop is a single call per row.
#[derive(Debug, Clone, Copy)]
pub struct ColorMapper {
    palette: Palette,
    min_db: f32,
    max_db: f32,
    log_scale: bool,
}

impl ColorMapper {
    pub fn new(palette: Palette, min_db: f32, max_db: f32, log_scale: bool) -> Self {
        Self {
            palette,
            min_db,
            max_db,
            log_scale,
        }
    }

    /// Pixel for one raw magnitude.
    pub fn pixel(&self, magnitude: f32) -> Rgba {
        let value = if self.log_scale {
            20.0 * (magnitude + LOG_EPSILON).log10()
        } else {
            magnitude
        };
        self.palette.pixel(normalize(value, self.min_db, self.max_db))
    }

    /// Pixel rendered where no frequency bin backs a display row.
    pub fn zero_pixel(&self) -> Rgba {
        self.pixel(0.0)
    }
}
