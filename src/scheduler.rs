//! Owned consumer loop driving a pipeline at a target tick rate.
//!
//! Front-ends that already have an event loop call
//! [`crate::pipeline::SpectrogramPipeline::tick`] themselves; the runner here
//! is for hosts that would rather hand the consumer activity to a dedicated
//! thread and read back copies of the image.

use crate::config::SpectrogramConfig;
use crate::error::ConfigError;
use crate::palette::Rgba;
use crate::pipeline::{SampleFeeder, SpectrogramPipeline};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const IDLE_BACKOFF: Duration = Duration::from_millis(1);
const DROP_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Consumer cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickRate {
    /// Back-to-back ticks, with only a brief backoff while starved.
    Unlimited,
    /// Fixed update rate in ticks per second.
    Hz(u32),
}

impl TickRate {
    fn interval(self) -> Option<Duration> {
        match self {
            TickRate::Unlimited => None,
            TickRate::Hz(hz) => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        }
    }
}

/// Flattened copy of the visible history for cross-thread rendering.
///
/// Pixels are column-major, oldest column first; row 0 of each column is the
/// lowest display frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

struct RunnerShared {
    pipeline: Mutex<SpectrogramPipeline>,
    stop: AtomicBool,
}

/// Background consumer thread ticking a pipeline at a fixed rate.
///
/// Stopping (explicitly or on drop) just parks the consumer; there is no
/// in-flight state to unwind.
pub struct SpectrogramRunner {
    shared: Arc<RunnerShared>,
    feeder: SampleFeeder,
    join: Option<JoinHandle<()>>,
}

impl SpectrogramRunner {
    /// Move `pipeline` onto a named consumer thread.
    pub fn spawn(pipeline: SpectrogramPipeline, rate: TickRate) -> Result<Self, ConfigError> {
        if rate == TickRate::Hz(0) {
            return Err(ConfigError::InvalidTickRate);
        }

        let feeder = pipeline.feeder();
        let shared = Arc::new(RunnerShared {
            pipeline: Mutex::new(pipeline),
            stop: AtomicBool::new(false),
        });
        let worker = Arc::clone(&shared);
        let join = thread::Builder::new()
            .name("openprism-consumer".into())
            .spawn(move || consume_loop(worker, rate))
            .expect("failed to spawn spectrogram consumer thread");

        Ok(Self {
            shared,
            feeder,
            join: Some(join),
        })
    }

    /// Producer handle; cloneable and safe to call from an audio callback.
    /// Feeding touches only the ring buffer, never the pipeline lock, so it
    /// cannot stall behind an in-progress tick's transform work.
    pub fn feeder(&self) -> SampleFeeder {
        self.feeder.clone()
    }

    /// Copy of the visible history, synchronized against concurrent writes.
    pub fn snapshot(&self) -> HistoryImage {
        let pipeline = self.shared.pipeline.lock();
        let (width, height) = pipeline.dimensions();
        let mut pixels = Vec::new();
        pipeline.copy_history_into(&mut pixels);
        HistoryImage {
            width,
            height,
            pixels,
        }
    }

    pub fn configure(&self, config: SpectrogramConfig) -> Result<(), ConfigError> {
        self.shared.pipeline.lock().configure(config)
    }

    pub fn resize(&self, width: usize, height: usize) -> Result<(), ConfigError> {
        self.shared.pipeline.lock().resize(width, height)
    }

    /// Stop ticking and join the consumer thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("[scheduler] consumer thread panicked");
            }
        }
    }
}

impl Drop for SpectrogramRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn consume_loop(shared: Arc<RunnerShared>, rate: TickRate) {
    info!("[scheduler] consumer running at {rate:?}");
    let interval = rate.interval();
    let mut next_deadline = interval.map(|step| Instant::now() + step);
    let mut last_drop_check = Instant::now();
    let mut drop_baseline = shared.pipeline.lock().dropped_samples();

    while !shared.stop.load(Ordering::Relaxed) {
        let produced = shared.pipeline.lock().tick();

        if last_drop_check.elapsed() >= DROP_CHECK_INTERVAL {
            let dropped = shared.pipeline.lock().dropped_samples();
            if dropped > drop_baseline {
                warn!(
                    "[scheduler] dropped {} unconsumed samples (total {})",
                    dropped - drop_baseline,
                    dropped
                );
                drop_baseline = dropped;
            }
            last_drop_check = Instant::now();
        }

        match (&mut next_deadline, interval) {
            (Some(deadline), Some(step)) => {
                let now = Instant::now();
                if *deadline > now {
                    thread::sleep(*deadline - now);
                }
                *deadline += step;
                if *deadline < Instant::now() {
                    // Fell behind; rebase instead of bursting to catch up.
                    *deadline = Instant::now() + step;
                }
            }
            _ => {
                if produced == 0 {
                    thread::sleep(IDLE_BACKOFF);
                }
            }
        }
    }
    info!("[scheduler] consumer stopped");
}
