//! Frequency grid for the plotted response curve.

use crate::error::ConfigError;

/// Frequency range and resolution of a rendered spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumRange {
    /// Lowest plotted frequency (Hz)
    pub f_min_hz: f64,

    /// Highest plotted frequency (Hz)
    pub f_max_hz: f64,

    /// Number of evenly spaced points, endpoints included
    pub points: usize,
}

impl Default for SpectrumRange {
    fn default() -> Self {
        Self {
            f_min_hz: 100.0,
            f_max_hz: 5000.0,
            points: 1000,
        }
    }
}

impl SpectrumRange {
    /// Evenly spaced frequencies from `f_min_hz` to `f_max_hz`
    pub fn frequencies(&self) -> Vec<f64> {
        match self.points {
            0 => Vec::new(),
            1 => vec![self.f_min_hz],
            n => {
                let step = (self.f_max_hz - self.f_min_hz) / (n - 1) as f64;
                (0..n).map(|i| self.f_min_hz + step * i as f64).collect()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points == 0 || !(self.f_min_hz > 0.0) || !(self.f_max_hz >= self.f_min_hz) {
            return Err(ConfigError::InvalidSpectrumRange {
                f_min: self.f_min_hz,
                f_max: self.f_max_hz,
                points: self.points,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequencies_include_endpoints() {
        let range = SpectrumRange::default();
        let freqs = range.frequencies();
        assert_eq!(freqs.len(), 1000);
        assert_eq!(freqs[0], 100.0);
        assert!((freqs[999] - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let range = SpectrumRange {
            f_min_hz: 5000.0,
            f_max_hz: 100.0,
            points: 10,
        };
        assert!(range.validate().is_err());
    }
}
