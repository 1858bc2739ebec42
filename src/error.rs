//! Error types for configuration, audio output and reference data.

use thiserror::Error;

/// A control value was rejected before it reached the shared snapshot.
///
/// The previously published configuration stays in effect.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frequency must be > 0 Hz, got {0}")]
    InvalidFrequency(f32),

    #[error("melody must contain at least one step")]
    EmptyMelody,

    #[error("melody step {index} has non-positive duration {duration_s}s")]
    InvalidStepDuration { index: usize, duration_s: f32 },

    #[error("{name} must be within [0, 1], got {value}")]
    LevelOutOfRange { name: &'static str, value: f32 },

    #[error("{name} must be > 0, got {value}")]
    NonPositiveMaterial { name: &'static str, value: f64 },

    #[error("sample rate must be > 0")]
    InvalidSampleRate,

    #[error("block size must be a power of two >= 64, got {0}")]
    InvalidBlockSize(usize),

    #[error("sample rate and block size are fixed for the engine's lifetime")]
    StreamFormatChanged,

    #[error("invalid spectrum range {f_min}..{f_max} Hz with {points} points")]
    InvalidSpectrumRange { f_min: f64, f_max: f64, points: usize },
}

/// Failures opening or driving the output device.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoOutputDevice,

    #[error("failed to query output device configuration: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to write WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reasons a reference table could not be used.
///
/// Only surfaced through logging; the loader falls back to the flat floor.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read reference data: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed value {token:?} on line {line}")]
    Parse { line: usize, token: String },

    #[error("reference data needs at least 2 samples, found {0}")]
    TooFewSamples(usize),
}
