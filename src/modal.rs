//! Resonant mode prediction from body geometry and plate materials.

mod predictor;
mod system;

// Re-export public types
pub use predictor::{ModalPredictor, ShiftFactors};
pub use system::AcousticModel;

/// A single body resonance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mode {
    /// Center frequency (Hz), > 0
    pub frequency: f64,
    /// Relative amplitude, >= 0
    pub amplitude: f64,
    /// Damping ratio, in (0, 1)
    pub damping: f64,
}

impl Mode {
    pub const fn new(frequency: f64, amplitude: f64, damping: f64) -> Self {
        Self {
            frequency,
            amplitude,
            damping,
        }
    }

    /// Resonance bandwidth term `damping * f0` (Hz)
    pub fn gamma(&self) -> f64 {
        self.damping * self.frequency
    }
}
