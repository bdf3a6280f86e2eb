//! Short-time spectral transform: window, real FFT, magnitude per bin.

use super::apply_window;
use super::window::{WindowCache, WindowKind};
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex32;
use std::sync::Arc;

/// Windowed real-input Fourier transform reused across frames.
///
/// Planning and window lookup happen once per `(frame_size, window)` pair;
/// [`SpectralTransform::magnitudes`] allocates nothing. The transform is
/// pure: a given frame always yields the same magnitudes.
pub struct SpectralTransform {
    planner: RealFftPlanner<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Arc<[f32]>,
    kind: WindowKind,
    frame_size: usize,
    real_buffer: Vec<f32>,
    spectrum_buffer: Vec<Complex32>,
    scratch_buffer: Vec<Complex32>,
    magnitude_buffer: Vec<f32>,
}

impl SpectralTransform {
    pub fn new(frame_size: usize, kind: WindowKind) -> Self {
        debug_assert!(frame_size > 0 && frame_size % 2 == 0);

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let window = WindowCache::global().get(kind, frame_size);
        let spectrum_buffer = fft.make_output_vec();
        let scratch_buffer = fft.make_scratch_vec();

        Self {
            planner,
            fft,
            window,
            kind,
            frame_size,
            real_buffer: vec![0.0; frame_size],
            spectrum_buffer,
            scratch_buffer,
            magnitude_buffer: vec![0.0; frame_size / 2],
        }
    }

    #[inline]
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of magnitude bins per transformed frame.
    #[inline]
    pub fn bins(&self) -> usize {
        self.frame_size / 2
    }

    /// Re-plan for a new frame size or window function.
    pub fn reconfigure(&mut self, frame_size: usize, kind: WindowKind) {
        debug_assert!(frame_size > 0 && frame_size % 2 == 0);
        if frame_size == self.frame_size && kind == self.kind {
            return;
        }

        self.frame_size = frame_size;
        self.kind = kind;
        self.fft = self.planner.plan_fft_forward(frame_size);
        self.window = WindowCache::global().get(kind, frame_size);
        self.real_buffer.resize(frame_size, 0.0);
        self.spectrum_buffer = self.fft.make_output_vec();
        self.scratch_buffer = self.fft.make_scratch_vec();
        self.magnitude_buffer.resize(frame_size / 2, 0.0);
    }

    /// Window `frame` and return the modulus of the first `frame_size / 2`
    /// spectrum bins. Bin 0 is the DC component; bin `k` corresponds to
    /// `k * sample_rate / frame_size` Hz. The mirrored upper half of the
    /// real-input spectrum is not exposed.
    pub fn magnitudes(&mut self, frame: &[f32]) -> &[f32] {
        debug_assert_eq!(frame.len(), self.frame_size);

        self.real_buffer.copy_from_slice(frame);
        apply_window(&mut self.real_buffer, &self.window);
        self.fft
            .process_with_scratch(
                &mut self.real_buffer,
                &mut self.spectrum_buffer,
                &mut self.scratch_buffer,
            )
            .expect("real FFT forward transform");

        for (target, complex) in self.magnitude_buffer.iter_mut().zip(&self.spectrum_buffer) {
            *target = complex.norm();
        }
        &self.magnitude_buffer
    }
}
