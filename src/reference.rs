//! Measured reference response data.
//!
//! The table holds uniformly spaced magnitude samples (dB) from 100 Hz to
//! 8200 Hz. It is read once at startup; a missing or malformed file leaves the
//! reference unset and every query returns a flat low-level floor.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ReferenceError;
use crate::smoothing;

/// Frequency of the first sample (Hz)
pub const REFERENCE_F_MIN_HZ: f64 = 100.0;

/// Frequency of the last sample (Hz)
pub const REFERENCE_F_MAX_HZ: f64 = 8200.0;

/// Level returned everywhere when no reference is loaded (dB)
pub const MISSING_REFERENCE_DB: f64 = -60.0;

/// Below the table: 3rd-order roll-off, 60 dB per decade
const LOW_ROLLOFF_DB_PER_DECADE: f64 = 60.0;

/// Above the table: 4th-order roll-off, 80 dB per decade
const HIGH_ROLLOFF_DB_PER_DECADE: f64 = 80.0;

/// Lowest frequency used for extrapolation, keeps log10 finite (Hz)
const MIN_QUERY_HZ: f64 = 1.0;

/// Sampled reference spectrum with an optional smoothed variant
#[derive(Debug, Clone, Default)]
pub struct ReferenceSpectrum {
    raw: Option<Arc<[f64]>>,
    smoothed: Option<Arc<[f64]>>,
    smoothing_level: f32,
}

impl ReferenceSpectrum {
    /// No reference data: queries return `MISSING_REFERENCE_DB`
    pub fn missing() -> Self {
        Self::default()
    }

    /// Build from samples already in memory (at least 2 values)
    pub fn from_samples(values_db: Vec<f64>) -> Result<Self, ReferenceError> {
        if values_db.len() < 2 {
            return Err(ReferenceError::TooFewSamples(values_db.len()));
        }
        Ok(Self {
            raw: Some(values_db.into()),
            smoothed: None,
            smoothing_level: 0.0,
        })
    }

    /// Load the table, falling back to `missing()` on any failure.
    ///
    /// The failure is logged once here; callers never see it.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(reference) => {
                info!(
                    path = %path.display(),
                    samples = reference.sample_count(),
                    "Loaded reference response"
                );
                reference
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Reference response unavailable, using flat {MISSING_REFERENCE_DB} dB floor"
                );
                Self::missing()
            }
        }
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let text = fs::read_to_string(path)?;
        Self::from_samples(parse_table(&text)?)
    }

    pub fn is_loaded(&self) -> bool {
        self.raw.is_some()
    }

    pub fn sample_count(&self) -> usize {
        self.raw.as_ref().map_or(0, |raw| raw.len())
    }

    pub fn smoothing_level(&self) -> f32 {
        self.smoothing_level
    }

    /// Recompute the smoothed table for a new level (0 disables smoothing)
    pub fn set_smoothing(&mut self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        self.smoothing_level = level;
        self.smoothed = match &self.raw {
            Some(raw) if smoothing::window_length(level, raw.len()) > 1 => {
                Some(smoothing::smooth_level(raw, level).into())
            }
            _ => None,
        };
    }

    /// Interpolated level (dB) at `frequency_hz`.
    ///
    /// Linear inside the sampled span, with a cubic roll-off below it and a
    /// 4th-order roll-off above it.
    pub fn level_db(&self, frequency_hz: f64) -> f64 {
        let Some(table) = self.smoothed.as_ref().or(self.raw.as_ref()) else {
            return MISSING_REFERENCE_DB;
        };
        let (first, last) = match (table.first(), table.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return MISSING_REFERENCE_DB,
        };

        if frequency_hz < REFERENCE_F_MIN_HZ {
            let f = frequency_hz.max(MIN_QUERY_HZ);
            return first + LOW_ROLLOFF_DB_PER_DECADE * (f / REFERENCE_F_MIN_HZ).log10();
        }
        if frequency_hz > REFERENCE_F_MAX_HZ {
            return last - HIGH_ROLLOFF_DB_PER_DECADE * (frequency_hz / REFERENCE_F_MAX_HZ).log10();
        }

        let step = (REFERENCE_F_MAX_HZ - REFERENCE_F_MIN_HZ) / (table.len() - 1) as f64;
        let position = (frequency_hz - REFERENCE_F_MIN_HZ) / step;
        let index = (position.floor() as usize).min(table.len() - 2);
        let frac = position - index as f64;
        table[index] + (table[index + 1] - table[index]) * frac
    }
}

/// Parse comma-separated numbers, one or more per line
pub fn parse_table(text: &str) -> Result<Vec<f64>, ReferenceError> {
    let mut values = Vec::new();
    for (line_index, line) in text.lines().enumerate() {
        for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let value = token.parse::<f64>().map_err(|_| ReferenceError::Parse {
                line: line_index + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}
