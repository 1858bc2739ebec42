//! Body response formulas shared by the spectrum plot and the audio filter.
//!
//! The plotted curve and the filter applied to the excitation call the same
//! functions here, so what is drawn is what is heard.

use rand::Rng;
use rustfft::num_complex::Complex;

use crate::modal::Mode;
use crate::params::ResponseMode;
use crate::reference::ReferenceSpectrum;

/// Constant low-frequency radiation term added to the modal sum
pub const RADIATION_FLOOR: f64 = 0.1;

/// Corner of the 3rd-order radiation high-pass (Hz)
pub const RADIATION_CORNER_HZ: f64 = 400.0;

/// Gain of the neutral reference curve at DC
const FLAT_LEVEL: f64 = 1.0;

/// Quadratic roll-off corner of the neutral reference curve (Hz)
const FLAT_ROLLOFF_HZ: f64 = 10_000.0;

/// Peak perturbation of `ResponseMode::Noisy` at noise level 1 (dB)
pub const NOISE_SPAN_DB: f64 = 12.0;

/// Magnitudes are floored here before taking the logarithm
pub const MAGNITUDE_FLOOR: f64 = 1e-9;

/// Complex sum of the radiation floor and every mode's Lorentzian resonance.
///
/// H(f) = floor + Σ A·f0² / ((f0² - f²) + j·γ·f), γ = damping·f0
pub fn modal_sum(frequency_hz: f64, modes: &[Mode]) -> Complex<f64> {
    let f = frequency_hz;
    modes
        .iter()
        .fold(Complex::new(RADIATION_FLOOR, 0.0), |acc, mode| {
            let f0_sq = mode.frequency * mode.frequency;
            let numerator = mode.amplitude * f0_sq;
            let denominator = Complex::new(f0_sq - f * f, mode.gamma() * f);
            acc + numerator / denominator
        })
}

/// Magnitude of a 3rd-order Butterworth high-pass at `RADIATION_CORNER_HZ`
pub fn radiation_gain(frequency_hz: f64) -> f64 {
    let x = (frequency_hz.abs() / RADIATION_CORNER_HZ).powi(3);
    x / (1.0 + x * x).sqrt()
}

/// Neutral reference curve: near-constant with a mild quadratic roll-off
pub fn flat_gain(frequency_hz: f64) -> f64 {
    let x = frequency_hz / FLAT_ROLLOFF_HZ;
    FLAT_LEVEL / (1.0 + x * x)
}

/// Linear gain for a level perturbation drawn uniformly in ±`noise_level`·span
pub fn noise_gain<R: Rng>(noise_level: f64, rng: &mut R) -> f64 {
    if noise_level <= 0.0 {
        return 1.0;
    }
    let offset_db = noise_level * NOISE_SPAN_DB * rng.gen_range(-1.0..=1.0);
    db_to_gain(offset_db)
}

pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.max(MAGNITUDE_FLOOR).log10()
}

/// Everything needed to evaluate the body response at one instant
#[derive(Debug, Clone, Copy)]
pub struct ResponseShape<'a> {
    pub mode: ResponseMode,
    pub modes: &'a [Mode],
    pub reference: &'a ReferenceSpectrum,
    pub noise_level: f64,
}

impl<'a> ResponseShape<'a> {
    /// Complex response at `frequency_hz`.
    ///
    /// `Model` and `Noisy` keep the resonance phase; `Flat` and `Sampled` are
    /// zero-phase magnitudes.
    pub fn at<R: Rng>(&self, frequency_hz: f64, rng: &mut R) -> Complex<f64> {
        match self.mode {
            ResponseMode::Flat => Complex::new(flat_gain(frequency_hz), 0.0),
            ResponseMode::Sampled => {
                Complex::new(db_to_gain(self.reference.level_db(frequency_hz)), 0.0)
            }
            ResponseMode::Model => self.model_at(frequency_hz),
            ResponseMode::Noisy => {
                self.model_at(frequency_hz) * noise_gain(self.noise_level, rng)
            }
        }
    }

    /// Level in dB at `frequency_hz`, floored at `MAGNITUDE_FLOOR`
    pub fn level_db<R: Rng>(&self, frequency_hz: f64, rng: &mut R) -> f64 {
        gain_to_db(self.at(frequency_hz, rng).norm())
    }

    fn model_at(&self, frequency_hz: f64) -> Complex<f64> {
        modal_sum(frequency_hz, self.modes) * radiation_gain(frequency_hz)
    }
}
