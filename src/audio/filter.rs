//! Block-domain body filter and output conditioning.

use std::f32::consts::TAU;
use std::sync::Arc;

use rand::Rng;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::response::ResponseShape;

/// Corner of the rumble high-pass after the body filter (Hz)
pub const HIGH_PASS_CORNER_HZ: f32 = 40.0;

/// RMS the normalizer drives each block toward
pub const TARGET_RMS: f32 = 0.1;

/// Blocks quieter than this are treated as silence and not normalized
pub const SILENCE_RMS: f32 = 1.0e-6;

/// Applies a body response to one block via FFT multiplication.
///
/// The response is sampled at the bin centres `k * sample_rate / size` for
/// k = 0..=size/2 and mirrored as its complex conjugate onto the negative
/// frequencies, so the filtered block stays real.
pub struct SpectralFilter {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    response: Vec<Complex<f32>>,
}

impl SpectralFilter {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            size,
            forward,
            inverse,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            response: vec![Complex::new(1.0, 0.0); size / 2 + 1],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Frequency of bin `k` (Hz)
    pub fn bin_frequency(&self, k: usize, sample_rate_hz: f64) -> f64 {
        k as f64 * sample_rate_hz / self.size as f64
    }

    /// Resample `shape` onto the bins; call again whenever the shape changes
    pub fn set_response<R: Rng>(
        &mut self,
        shape: &ResponseShape<'_>,
        sample_rate_hz: f64,
        rng: &mut R,
    ) {
        for k in 0..self.response.len() {
            let h = shape.at(self.bin_frequency(k, sample_rate_hz), rng);
            self.response[k] = Complex::new(h.re as f32, h.im as f32);
        }
    }

    /// Current per-bin response, DC through Nyquist
    pub fn response(&self) -> &[Complex<f32>] {
        &self.response
    }

    /// Filter `input` into `output`; both must be `size` samples long
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let n = self.size;
        for (slot, x) in self.buffer.iter_mut().zip(input) {
            *slot = Complex::new(*x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let half = n / 2;
        for k in 0..=half {
            let h = self.response[k];
            self.buffer[k] *= h;
            if k > 0 && k < half {
                self.buffer[n - k] *= h.conj();
            }
        }

        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        let scale = 1.0 / n as f32;
        for (y, c) in output.iter_mut().zip(&self.buffer) {
            *y = c.re * scale;
        }
    }
}

/// First-order high-pass with state carried across blocks
#[derive(Debug, Clone)]
pub struct HighPass {
    alpha: f32,
    x1: f32,
    y1: f32,
}

impl HighPass {
    pub fn new(corner_hz: f32, sample_rate_hz: f32) -> Self {
        let rc = 1.0 / (TAU * corner_hz);
        let dt = 1.0 / sample_rate_hz;
        Self {
            alpha: rc / (rc + dt),
            x1: 0.0,
            y1: 0.0,
        }
    }

    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let x = *sample;
            let y = self.alpha * (self.y1 + x - self.x1);
            self.x1 = x;
            self.y1 = y;
            *sample = y;
        }
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// Scale the block to `TARGET_RMS` when it is not silent, then soft-limit
/// every sample with `tanh`.
pub fn normalize_and_limit(block: &mut [f32]) {
    if block.is_empty() {
        return;
    }
    let rms = (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt();
    let gain = if rms > SILENCE_RMS { TARGET_RMS / rms } else { 1.0 };
    for sample in block.iter_mut() {
        *sample = (*sample * gain).tanh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::Mode;
    use crate::params::ResponseMode;
    use crate::reference::ReferenceSpectrum;

    #[test]
    fn test_unit_response_passes_block_through() {
        let mut filter = SpectralFilter::new(256);
        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut output = vec![0.0; 256];
        filter.process(&input, &mut output);
        for (x, y) in input.iter().zip(&output) {
            assert!((x - y).abs() < 1e-4);
        }
    }

    #[test]
    fn test_model_response_removes_dc() {
        let reference = ReferenceSpectrum::missing();
        let modes = [Mode::new(500.0, 1.0, 0.05)];
        let shape = ResponseShape {
            mode: ResponseMode::Model,
            modes: &modes,
            reference: &reference,
            noise_level: 0.0,
        };
        let mut filter = SpectralFilter::new(512);
        filter.set_response(&shape, 44100.0, &mut rand::thread_rng());
        assert_eq!(filter.response()[0], Complex::new(0.0, 0.0));

        let mut output = vec![0.0; 512];
        filter.process(&[1.0; 512], &mut output);
        assert!(output.iter().all(|y| y.abs() < 1e-4));
    }

    #[test]
    fn test_high_pass_blocks_dc_across_blocks() {
        let mut hp = HighPass::new(HIGH_PASS_CORNER_HZ, 44100.0);
        let mut block = [1.0f32; 1024];
        for _ in 0..20 {
            block.fill(1.0);
            hp.process(&mut block);
        }
        assert!(block.iter().all(|y| y.abs() < 1e-3));
    }

    #[test]
    fn test_normalize_and_limit() {
        let mut loud: Vec<f32> = (0..1024).map(|i| 50.0 * (i as f32 * 0.1).sin()).collect();
        normalize_and_limit(&mut loud);
        let rms = (loud.iter().map(|s| s * s).sum::<f32>() / 1024.0).sqrt();
        assert!((rms - TARGET_RMS).abs() < 0.01);
        assert!(loud.iter().all(|s| s.abs() < 1.0));

        let mut silent = [0.0f32; 64];
        normalize_and_limit(&mut silent);
        assert!(silent.iter().all(|s| *s == 0.0));
    }
}
