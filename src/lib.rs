//! Real-time scrolling spectrogram engine.
//!
//! `openprism` turns a live stream of audio samples into a scrolling
//! time/frequency image. A bounded ring buffer absorbs producer bursts, a
//! consumer tick extracts overlapped frames, transforms them into per-bin
//! magnitudes, maps those through a palette and stores the resulting color
//! columns in a circular history that front-ends read by logical offset.
//!
//! The crate owns no window, capture device or transport; shells push raw
//! samples in through [`pipeline::SampleFeeder`] and pull rendered columns
//! out through [`pipeline::SpectrogramPipeline::column_at`] or a
//! [`scheduler::SpectrogramRunner`] snapshot.

pub mod buffer;
pub mod config;
pub mod dsp;
pub mod error;
pub mod history;
pub mod palette;
pub mod pipeline;
pub mod scheduler;
pub mod telemetry;

pub use config::SpectrogramConfig;
pub use dsp::window::WindowKind;
pub use error::ConfigError;
pub use palette::{ColorMapper, Palette, Rgba};
pub use pipeline::{SampleFeeder, SpectrogramPipeline};
pub use scheduler::{HistoryImage, SpectrogramRunner, TickRate};
