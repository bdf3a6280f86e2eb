//! Spectral analysis primitives shared by the pipeline.

pub mod spectral;
pub mod window;

/// Multiply a frame element-wise by precomputed window coefficients.
#[inline]
pub fn apply_window(buffer: &mut [f32], window: &[f32]) {
    debug_assert_eq!(buffer.len(), window.len());
    for (sample, coeff) in buffer.iter_mut().zip(window.iter()) {
        *sample *= *coeff;
    }
}
