//! Producer/consumer glue binding the sample buffer to the visible image.
//!
//! One producer path ([`SampleFeeder::feed`]) appends raw samples as they
//! arrive; one consumer path ([`SpectrogramPipeline::tick`]) drains every
//! complete frame, transforms it and stores a color column. The ring buffer
//! is the only state the two paths share.

use crate::buffer::SampleRingBuffer;
use crate::config::SpectrogramConfig;
use crate::dsp::spectral::SpectralTransform;
use crate::error::ConfigError;
use crate::history::ScrollingHistory;
use crate::palette::{ColorMapper, Rgba};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Viewport dimensions used until the host reports a real size.
pub const DEFAULT_WIDTH: usize = 800;
pub const DEFAULT_HEIGHT: usize = 600;

/// Producer-side handle appending samples to the shared ring buffer.
///
/// Cheap to clone and safe to call from an audio callback: feeding only
/// contends for the short append critical section, never for transform or
/// column work.
#[derive(Clone)]
pub struct SampleFeeder {
    ring: Arc<Mutex<SampleRingBuffer>>,
    dropped: Arc<AtomicU64>,
}

impl SampleFeeder {
    pub fn feed(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let dropped = self.ring.lock().append(samples);
        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        }
    }
}

/// Real-time spectrogram pipeline: raw samples in, scrolling image out.
pub struct SpectrogramPipeline {
    config: SpectrogramConfig,
    hop: usize,
    ring: Arc<Mutex<SampleRingBuffer>>,
    dropped: Arc<AtomicU64>,
    transform: SpectralTransform,
    mapper: ColorMapper,
    blank: Rgba,
    history: ScrollingHistory,
    /// Scratch copy of the frame being analyzed.
    frame: Vec<f32>,
    /// Scratch for the column being built.
    column: Vec<Rgba>,
    /// Per display row, the source bin it samples, or `None` past the last
    /// valid bin.
    row_bins: Vec<Option<usize>>,
}

impl SpectrogramPipeline {
    pub fn new(config: SpectrogramConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mapper = ColorMapper::new(
            config.palette,
            config.min_db,
            config.max_db,
            config.log_scale,
        );
        let blank = mapper.zero_pixel();

        let mut pipeline = Self {
            hop: config.hop(),
            ring: Arc::new(Mutex::new(SampleRingBuffer::with_capacity(
                config.buffer_capacity,
            ))),
            dropped: Arc::new(AtomicU64::new(0)),
            transform: SpectralTransform::new(config.frame_size, config.window),
            mapper,
            blank,
            history: ScrollingHistory::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, blank),
            frame: vec![0.0; config.frame_size],
            column: Vec::new(),
            row_bins: Vec::new(),
            config,
        };
        pipeline.rebuild_row_mapping();
        Ok(pipeline)
    }

    pub fn config(&self) -> SpectrogramConfig {
        self.config
    }

    /// Hop currently applied between successive frames.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Samples evicted unconsumed since construction.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Producer handle bound to this pipeline's ring buffer.
    pub fn feeder(&self) -> SampleFeeder {
        SampleFeeder {
            ring: Arc::clone(&self.ring),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Producer entry point, usable in place when no thread split is needed.
    pub fn feed(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let dropped = self.ring.lock().append(samples);
        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        }
    }

    /// Consumer entry point: drain every complete frame currently buffered,
    /// appending one history column per frame. Returns the number of columns
    /// written; zero means the buffer was starved, which is not an error.
    ///
    /// A single producer burst can carry several overlapped frames; all of
    /// them are emitted here so the scroll rate tracks the audio rate.
    pub fn tick(&mut self) -> usize {
        let mut produced = 0;
        loop {
            {
                // Peek and advance under one lock acquisition so a concurrent
                // append cannot interleave with the hop bookkeeping.
                let mut ring = self.ring.lock();
                if !ring.peek_into(&mut self.frame) {
                    break;
                }
                ring.advance(self.hop);
            }

            let magnitudes = self.transform.magnitudes(&self.frame);
            for (pixel, bin) in self.column.iter_mut().zip(&self.row_bins) {
                *pixel = match bin {
                    Some(idx) => self.mapper.pixel(magnitudes[*idx]),
                    None => self.blank,
                };
            }
            self.history.write_column(&self.column);
            produced += 1;
        }
        produced
    }

    /// Read-only accessor for renderers: column 0 is the oldest visible,
    /// `width - 1` the most recent. Row 0 is the lowest display frequency.
    pub fn column_at(&self, offset: usize) -> &[Rgba] {
        self.history.column_at(offset)
    }

    /// Current (width, height) of the visible history.
    pub fn dimensions(&self) -> (usize, usize) {
        self.history.dimensions()
    }

    /// Flatten the visible history into `out`, oldest column first.
    pub fn copy_history_into(&self, out: &mut Vec<Rgba>) {
        self.history.copy_into(out);
    }

    /// Adopt a new viewport size, discarding the visible history.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if (width, height) == self.history.dimensions() {
            return Ok(());
        }

        self.history.resize(width, height);
        self.rebuild_row_mapping();
        debug!("[pipeline] history resized to {width}x{height}");
        Ok(())
    }

    /// Replace the analysis parameters. The visible history is cleared: a
    /// parameter change invalidates every column already on screen. Buffered
    /// samples survive, trimmed to the new capacity newest-first.
    pub fn configure(&mut self, config: SpectrogramConfig) -> Result<(), ConfigError> {
        config.validate()?;

        self.transform.reconfigure(config.frame_size, config.window);
        self.mapper = ColorMapper::new(
            config.palette,
            config.min_db,
            config.max_db,
            config.log_scale,
        );
        self.blank = self.mapper.zero_pixel();
        self.hop = config.hop();
        self.frame.resize(config.frame_size, 0.0);
        self.ring.lock().set_capacity(config.buffer_capacity);
        self.history.reset(self.blank);
        self.config = config;
        self.rebuild_row_mapping();
        info!(
            "[pipeline] reconfigured: frame_size={}, hop={}, palette={:?}, window={:?}",
            config.frame_size, self.hop, config.palette, config.window
        );
        Ok(())
    }

    /// Precompute the display-row to frequency-bin mapping for the current
    /// config and viewport height.
    fn rebuild_row_mapping(&mut self) {
        let height = self.history.height();
        let bins = self.config.bins();
        let bin_scale =
            self.config.max_display_hz * self.config.frame_size as f32 / self.config.sample_rate;

        self.row_bins.clear();
        self.row_bins.reserve(height);
        for row in 0..height {
            let bin = ((row as f32 / height as f32) * bin_scale).round() as usize;
            self.row_bins.push((bin < bins).then_some(bin));
        }
        self.column.resize(height, self.blank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::window::WindowKind;
    use crate::palette::Palette;

    fn small_config() -> SpectrogramConfig {
        SpectrogramConfig {
            frame_size: 8,
            overlap_ratio: 0.5,
            buffer_capacity: 64,
            sample_rate: 16.0,
            max_display_hz: 8.0,
            ..SpectrogramConfig::default()
        }
    }

    fn sine(freq_hz: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| {
                let t = n as f32 / sample_rate;
                (core::f32::consts::TAU * freq_hz * t).sin()
            })
            .collect()
    }

    #[test]
    fn rejects_invalid_configuration_up_front() {
        let config = SpectrogramConfig {
            frame_size: 0,
            ..SpectrogramConfig::default()
        };
        assert!(SpectrogramPipeline::new(config).is_err());
    }

    #[test]
    fn starved_tick_produces_nothing() {
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        pipeline.feed(&[0.0; 7]);
        assert_eq!(pipeline.tick(), 0);
    }

    #[test]
    fn one_burst_yields_every_overlapped_frame() {
        // 16 samples, frame 8, hop 4: frames start at 0, 4 and 8.
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        pipeline.feed(&sine(2.0, 16.0, 16));
        assert_eq!(pipeline.tick(), 3);
        assert_eq!(pipeline.tick(), 0);
    }

    #[test]
    fn feeding_across_ticks_preserves_the_hop_cadence() {
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        let samples = sine(2.0, 16.0, 32);

        let mut total = 0;
        for chunk in samples.chunks(5) {
            pipeline.feed(chunk);
            total += pipeline.tick();
        }
        // 32 samples cover frame starts 0, 4, .., 24.
        assert_eq!(total, 7);
    }

    #[test]
    fn columns_land_bottom_up_with_blank_rows_past_the_last_bin() {
        // frame 8 at 16 Hz gives 4 bins; 16 display rows then map to bins
        // round(row / 4), so rows 14 and 15 fall past bin 3.
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        pipeline.resize(4, 16).unwrap();

        // A DC offset drives bin 0, sampled by the bottom rows.
        pipeline.feed(&[1.0; 8]);
        assert_eq!(pipeline.tick(), 1);

        let blank = pipeline.mapper.zero_pixel();
        let newest = pipeline.column_at(3);
        assert_ne!(newest[0], blank);
        assert_eq!(newest[14], blank);
        assert_eq!(newest[15], blank);
    }

    #[test]
    fn resize_rejects_zero_dimensions() {
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        assert_eq!(
            pipeline.resize(0, 10),
            Err(ConfigError::InvalidDimensions {
                width: 0,
                height: 10
            })
        );
        assert_eq!(pipeline.dimensions(), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
    }

    #[test]
    fn failed_configure_leaves_the_pipeline_untouched() {
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        let bad = SpectrogramConfig {
            overlap_ratio: 1.0,
            ..small_config()
        };
        assert!(pipeline.configure(bad).is_err());
        assert_eq!(pipeline.config(), small_config());
        assert_eq!(pipeline.hop(), 4);
    }

    #[test]
    fn configure_clears_the_visible_history() {
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        pipeline.resize(4, 8).unwrap();
        pipeline.feed(&sine(2.0, 16.0, 16));
        assert!(pipeline.tick() > 0);

        let mut config = small_config();
        config.palette = Palette::Grayscale;
        pipeline.configure(config).unwrap();

        let blank = pipeline.mapper.zero_pixel();
        for offset in 0..4 {
            assert!(pipeline.column_at(offset).iter().all(|&px| px == blank));
        }
    }

    #[test]
    fn dropped_samples_are_accounted() {
        let config = SpectrogramConfig {
            buffer_capacity: 8,
            ..small_config()
        };
        let pipeline = SpectrogramPipeline::new(config).unwrap();
        pipeline.feed(&sine(2.0, 16.0, 20));
        assert_eq!(pipeline.dropped_samples(), 12);
    }

    #[test]
    fn feeder_and_pipeline_share_the_ring() {
        let mut pipeline = SpectrogramPipeline::new(small_config()).unwrap();
        let feeder = pipeline.feeder();
        feeder.feed(&sine(2.0, 16.0, 8));
        assert_eq!(pipeline.tick(), 1);
    }

    #[test]
    fn identical_input_produces_identical_history() {
        let run = || {
            let mut pipeline = SpectrogramPipeline::new(SpectrogramConfig {
                frame_size: 64,
                buffer_capacity: 1024,
                sample_rate: 8000.0,
                max_display_hz: 4000.0,
                ..SpectrogramConfig::default()
            })
            .unwrap();
            pipeline.resize(16, 32).unwrap();
            for chunk in sine(440.0, 8000.0, 640).chunks(37) {
                pipeline.feed(chunk);
                pipeline.tick();
            }
            let mut image = Vec::new();
            pipeline.copy_history_into(&mut image);
            image
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn tone_lights_the_expected_row() {
        // 1 kHz tone, 64-bin display over 0..11025 Hz at 44.1 kHz.
        let config = SpectrogramConfig {
            frame_size: 1024,
            buffer_capacity: 4096,
            max_display_hz: 11_025.0,
            window: WindowKind::Hamming,
            ..SpectrogramConfig::default()
        };
        let mut pipeline = SpectrogramPipeline::new(config).unwrap();
        pipeline.resize(8, 64).unwrap();
        pipeline.feed(&sine(1000.0, 44_100.0, 1024));
        assert_eq!(pipeline.tick(), 1);

        let newest = pipeline.column_at(7);
        let hottest = newest
            .iter()
            .enumerate()
            .max_by_key(|(_, px)| px.r as u32 + px.g as u32 + px.b as u32)
            .map(|(row, _)| row)
            .unwrap();

        // Row r samples bin round(r / 64 * 256); 1 kHz sits at bin 23,
        // closest to row 6 (bin 24).
        assert!(hottest.abs_diff(6) <= 1, "hottest row {hottest}");
    }
}
