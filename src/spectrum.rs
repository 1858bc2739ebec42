//! Spectrum calculator: renders a mode list into a (frequency, dB) curve.

use std::sync::Arc;

use rand::Rng;

use crate::error::ConfigError;
use crate::modal::Mode;
use crate::params::{check_level, ResponseMode, SpectrumRange};
use crate::reference::ReferenceSpectrum;
use crate::response::ResponseShape;
use crate::smoothing;

/// Renders response curves for the spectrum display
#[derive(Debug, Clone, Default)]
pub struct SpectrumCalculator {
    reference: Arc<ReferenceSpectrum>,
}

impl SpectrumCalculator {
    pub fn new(reference: Arc<ReferenceSpectrum>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceSpectrum {
        &self.reference
    }

    /// Level in dB at every frequency of `range`.
    ///
    /// `noise_level` only affects `ResponseMode::Noisy`. When
    /// `smoothing_level` is above zero the finished dB curve is smoothed,
    /// except for `ResponseMode::Sampled`, which reads the reference table
    /// smoothed to that level, the same table the synthesizer filters with.
    pub fn compute(
        &self,
        modes: &[Mode],
        range: &SpectrumRange,
        mode: ResponseMode,
        noise_level: f32,
        smoothing_level: f32,
    ) -> Result<Vec<(f64, f64)>, ConfigError> {
        self.compute_with_rng(
            modes,
            range,
            mode,
            noise_level,
            smoothing_level,
            &mut rand::thread_rng(),
        )
    }

    /// `compute` with a caller-supplied noise source
    pub fn compute_with_rng<R: Rng>(
        &self,
        modes: &[Mode],
        range: &SpectrumRange,
        mode: ResponseMode,
        noise_level: f32,
        smoothing_level: f32,
        rng: &mut R,
    ) -> Result<Vec<(f64, f64)>, ConfigError> {
        range.validate()?;
        check_level("noise_level", noise_level)?;
        check_level("smoothing_level", smoothing_level)?;

        let resmoothed;
        let reference = if mode == ResponseMode::Sampled
            && smoothing_level != self.reference.smoothing_level()
        {
            let mut table = ReferenceSpectrum::clone(&self.reference);
            table.set_smoothing(smoothing_level);
            resmoothed = table;
            &resmoothed
        } else {
            &*self.reference
        };

        let shape = ResponseShape {
            mode,
            modes,
            reference,
            noise_level: noise_level as f64,
        };
        let frequencies = range.frequencies();
        let mut levels: Vec<f64> = frequencies
            .iter()
            .map(|&f| shape.level_db(f, rng))
            .collect();

        if smoothing_level > 0.0 && mode != ResponseMode::Sampled {
            levels = smoothing::smooth_level(&levels, smoothing_level);
        }

        Ok(frequencies.into_iter().zip(levels).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::AcousticModel;
    use crate::response::{gain_to_db, radiation_gain, RADIATION_FLOOR};

    fn default_modes() -> Arc<[Mode]> {
        AcousticModel::default().predict()
    }

    #[test]
    fn test_deterministic_modes_repeat_exactly() {
        let calculator = SpectrumCalculator::default();
        let modes = default_modes();
        let range = SpectrumRange::default();
        for mode in [ResponseMode::Model, ResponseMode::Flat, ResponseMode::Sampled] {
            let a = calculator.compute(&modes, &range, mode, 0.7, 0.0).unwrap();
            let b = calculator.compute(&modes, &range, mode, 0.7, 0.0).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), range.points);
        }
    }

    #[test]
    fn test_noisy_converges_to_model() {
        let calculator = SpectrumCalculator::default();
        let modes = default_modes();
        let range = SpectrumRange::default();
        let model = calculator
            .compute(&modes, &range, ResponseMode::Model, 0.0, 0.0)
            .unwrap();

        let max_deviation = |noise: f32| -> f64 {
            let noisy = calculator
                .compute(&modes, &range, ResponseMode::Noisy, noise, 0.0)
                .unwrap();
            noisy
                .iter()
                .zip(&model)
                .map(|((_, a), (_, b))| (a - b).abs())
                .fold(0.0, f64::max)
        };

        assert_eq!(max_deviation(0.0), 0.0);
        assert!(max_deviation(0.01) <= 0.12 + 1e-9);
        assert!(max_deviation(0.01) < max_deviation(1.0));
    }

    #[test]
    fn test_empty_modes_give_radiation_floor() {
        let calculator = SpectrumCalculator::default();
        let range = SpectrumRange::default();
        let curve = calculator
            .compute(&[], &range, ResponseMode::Model, 0.0, 0.0)
            .unwrap();
        for (f, db) in curve {
            let expected = gain_to_db(RADIATION_FLOOR * radiation_gain(f));
            assert!((db - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_reference_is_flat() {
        let calculator = SpectrumCalculator::new(Arc::new(ReferenceSpectrum::missing()));
        let curve = calculator
            .compute(&[], &SpectrumRange::default(), ResponseMode::Sampled, 0.0, 0.5)
            .unwrap();
        assert!(curve.iter().all(|(_, db)| (db + 60.0).abs() < 1e-9));
    }

    #[test]
    fn test_sampled_curve_reads_smoothed_table() {
        let bumpy: Vec<f64> = (0..82).map(|i| -40.0 + 10.0 * (i % 2) as f64).collect();
        let raw = ReferenceSpectrum::from_samples(bumpy).unwrap();
        let calculator = SpectrumCalculator::new(Arc::new(raw.clone()));
        let mut table = raw.clone();
        table.set_smoothing(0.5);

        let range = SpectrumRange::default();
        let curve = calculator
            .compute(&[], &range, ResponseMode::Sampled, 0.0, 0.5)
            .unwrap();
        for (f, db) in &curve {
            assert!((db - table.level_db(*f)).abs() < 1e-9, "{f} Hz");
        }
        assert!(curve
            .iter()
            .any(|(f, db)| (db - raw.level_db(*f)).abs() > 1.0));
    }

    #[test]
    fn test_model_peaks_near_air_mode() {
        let calculator = SpectrumCalculator::default();
        let modes = default_modes();
        let range = SpectrumRange {
            f_min_hz: 200.0,
            f_max_hz: 350.0,
            points: 151,
        };
        let curve = calculator
            .compute(&modes, &range, ResponseMode::Model, 0.0, 0.0)
            .unwrap();
        let (peak_f, _) = curve
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |best, p| if p.1 > best.1 { p } else { best });
        assert!((peak_f - modes[0].frequency).abs() < 5.0);
    }

    #[test]
    fn test_smoothing_flattens_peaks() {
        let calculator = SpectrumCalculator::default();
        let modes = default_modes();
        let range = SpectrumRange::default();
        let peak = |smoothing: f32| {
            calculator
                .compute(&modes, &range, ResponseMode::Model, 0.0, smoothing)
                .unwrap()
                .into_iter()
                .map(|(_, db)| db)
                .fold(f64::MIN, f64::max)
        };
        assert!(peak(1.0) < peak(0.0));
    }

    #[test]
    fn test_rejects_out_of_range_controls() {
        let calculator = SpectrumCalculator::default();
        let range = SpectrumRange::default();
        assert!(calculator
            .compute(&[], &range, ResponseMode::Noisy, 1.5, 0.0)
            .is_err());
        let bad_range = SpectrumRange {
            points: 0,
            ..SpectrumRange::default()
        };
        assert!(calculator
            .compute(&[], &bad_range, ResponseMode::Model, 0.0, 0.0)
            .is_err());
    }
}
