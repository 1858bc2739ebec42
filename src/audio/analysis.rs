//! Spectrogram analysis of published audio blocks.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::response::MAGNITUDE_FLOOR;

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Hann-windowed magnitude spectrum of fixed-size blocks
pub struct BlockAnalyzer {
    sample_rate_hz: f32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl BlockAnalyzer {
    pub fn new(size: usize, sample_rate_hz: f32) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            sample_rate_hz,
            fft: planner.plan_fft_forward(size),
            window: (0..size).map(|i| hann_window(i, size)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    pub fn size(&self) -> usize {
        self.window.len()
    }

    /// Bin spacing (Hz)
    pub fn resolution_hz(&self) -> f32 {
        self.sample_rate_hz / self.size() as f32
    }

    /// (frequency Hz, level dB) for bins DC through Nyquist.
    ///
    /// Shorter blocks are zero-padded, longer ones truncated.
    pub fn spectrum_db(&mut self, block: &[f32]) -> Vec<(f32, f32)> {
        let size = self.size();
        for i in 0..size {
            let x = block.get(i).copied().unwrap_or(0.0);
            self.buffer[i] = Complex::new(x * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let resolution = self.resolution_hz();
        self.buffer[..=size / 2]
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let db = 20.0 * c.norm().max(MAGNITUDE_FLOOR as f32).log10();
                (k as f32 * resolution, db)
            })
            .collect()
    }

    /// Frequency of the loudest non-DC bin, `None` for a silent block
    pub fn dominant_frequency(&mut self, block: &[f32]) -> Option<f32> {
        let spectrum = self.spectrum_db(block);
        let floor_db = 20.0 * (MAGNITUDE_FLOOR as f32).log10();
        spectrum
            .into_iter()
            .skip(1)
            .filter(|(_, db)| *db > floor_db + 1.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(f, _)| f)
    }
}
