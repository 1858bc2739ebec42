//! Synthesizer control surface: pitch, excitation model, response mode, bow.

use std::sync::Arc;

use crate::error::ConfigError;

/// Audio constants
pub mod audio_constants {
    /// Default output sample rate (Hz)
    pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

    /// Audio block size (frames per spectral filtering block)
    /// 1024 = 23.2ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 1024;

    /// Smallest block size the spectral filter accepts
    pub const MIN_BLOCK_SIZE: usize = 64;

    /// Capacity of the visualization hand-off (in blocks)
    pub const VISUALIZATION_QUEUE_BLOCKS: usize = 10;
}

/// One note of a melody sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodyStep {
    /// Note frequency (Hz)
    pub frequency_hz: f32,

    /// Note length (seconds)
    pub duration_s: f32,
}

impl MelodyStep {
    pub const fn new(frequency_hz: f32, duration_s: f32) -> Self {
        Self {
            frequency_hz,
            duration_s,
        }
    }
}

/// Fundamental frequency source
#[derive(Debug, Clone, PartialEq)]
pub enum Pitch {
    /// Constant frequency (Hz)
    Fixed(f32),

    /// Looping sequence of notes
    Melody(Arc<[MelodyStep]>),
}

impl Default for Pitch {
    fn default() -> Self {
        Self::Fixed(196.0) // G3 open string
    }
}

impl Pitch {
    pub fn melody(steps: impl Into<Arc<[MelodyStep]>>) -> Self {
        Self::Melody(steps.into())
    }

    /// Total loop length in seconds (zero for a fixed pitch)
    pub fn total_duration_s(&self) -> f64 {
        match self {
            Self::Fixed(_) => 0.0,
            Self::Melody(steps) => steps.iter().map(|s| s.duration_s as f64).sum(),
        }
    }

    /// Frequency sounding at `elapsed_s` seconds since the stream started.
    ///
    /// Melodies loop: the position is `elapsed_s mod total_duration`, and the
    /// active note is found by a linear scan of cumulative durations.
    pub fn resolve(&self, elapsed_s: f64) -> f32 {
        match self {
            Self::Fixed(hz) => *hz,
            Self::Melody(steps) => {
                let total = self.total_duration_s();
                let Some(last) = steps.last() else {
                    return 0.0;
                };
                if total <= 0.0 {
                    return last.frequency_hz;
                }
                let position = elapsed_s.rem_euclid(total);
                let mut cumulative = 0.0;
                for step in steps.iter() {
                    cumulative += step.duration_s as f64;
                    if position < cumulative {
                        return step.frequency_hz;
                    }
                }
                // Rounding can leave position a hair past the final boundary
                last.frequency_hz
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Fixed(hz) => check_frequency(*hz),
            Self::Melody(steps) => {
                if steps.is_empty() {
                    return Err(ConfigError::EmptyMelody);
                }
                for (index, step) in steps.iter().enumerate() {
                    check_frequency(step.frequency_hz)?;
                    if !(step.duration_s.is_finite() && step.duration_s > 0.0) {
                        return Err(ConfigError::InvalidStepDuration {
                            index,
                            duration_s: step.duration_s,
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_frequency(hz: f32) -> Result<(), ConfigError> {
    if hz.is_finite() && hz > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidFrequency(hz))
    }
}

/// Open-string and melody presets offered by the string selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPreset {
    G3,
    D4,
    A4,
    E5,
    /// Opening phrase of the Sibelius violin concerto
    SibeliusOpening,
}

impl StringPreset {
    pub const ALL: [StringPreset; 5] = [
        StringPreset::G3,
        StringPreset::D4,
        StringPreset::A4,
        StringPreset::E5,
        StringPreset::SibeliusOpening,
    ];

    const SIBELIUS_OPENING: [MelodyStep; 7] = [
        MelodyStep::new(587.33, 1.5),  // D5
        MelodyStep::new(783.99, 0.4),  // G5
        MelodyStep::new(880.00, 0.4),  // A5
        MelodyStep::new(1174.66, 1.0), // D6
        MelodyStep::new(1108.73, 0.4), // C#6
        MelodyStep::new(932.33, 0.4),  // Bb5
        MelodyStep::new(880.00, 1.0),  // A5
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::G3 => "g3",
            Self::D4 => "d4",
            Self::A4 => "a4",
            Self::E5 => "e5",
            Self::SibeliusOpening => "sibelius",
        }
    }

    pub fn pitch(self) -> Pitch {
        match self {
            Self::G3 => Pitch::Fixed(196.0),
            Self::D4 => Pitch::Fixed(293.66),
            Self::A4 => Pitch::Fixed(440.0),
            Self::E5 => Pitch::Fixed(659.25),
            Self::SibeliusOpening => Pitch::melody(Self::SIBELIUS_OPENING.to_vec()),
        }
    }
}

/// Physical excitation model driving the body filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcitationKind {
    /// Band-limited sawtooth (Helmholtz motion approximation)
    #[default]
    Sawtooth,

    /// Digital waveguide with nonlinear bow friction
    Waveguide,

    /// Finite-difference time-domain string
    Fdtd,
}

impl ExcitationKind {
    pub const ALL: [ExcitationKind; 3] = [
        ExcitationKind::Sawtooth,
        ExcitationKind::Waveguide,
        ExcitationKind::Fdtd,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sawtooth => "sawtooth",
            Self::Waveguide => "waveguide",
            Self::Fdtd => "fdtd",
        }
    }

    /// Stable slot index for per-variant state tables
    pub fn index(self) -> usize {
        self as usize
    }
}

/// How the body response is rendered (plot) and applied (audio)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Sum of modal resonances shaped by radiation efficiency
    #[default]
    Model,

    /// Neutral reference curve with a mild high-frequency roll-off
    Flat,

    /// Measured reference data
    Sampled,

    /// Model response with random level perturbation
    Noisy,
}

impl ResponseMode {
    pub const ALL: [ResponseMode; 4] = [
        ResponseMode::Model,
        ResponseMode::Flat,
        ResponseMode::Sampled,
        ResponseMode::Noisy,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Flat => "flat",
            Self::Sampled => "sampled",
            Self::Noisy => "noisy",
        }
    }
}

/// Complete synthesizer configuration, swapped wholesale into the engine
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizerConfig {
    /// Output sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Frames per processing block (power of two)
    pub block_size: usize,

    /// Fundamental frequency or melody
    pub pitch: Pitch,

    /// Active excitation model
    pub excitation: ExcitationKind,

    /// Body response applied to the excitation
    pub response_mode: ResponseMode,

    /// Perturbation amount for `ResponseMode::Noisy` (0..1)
    pub noise_level: f32,

    /// Smoothing applied to the reference table (0..1)
    pub smoothing_level: f32,

    /// Bow speed control (0..1)
    pub bow_velocity: f32,

    /// Bow pressure control (0..1)
    pub bow_force: f32,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: audio_constants::DEFAULT_SAMPLE_RATE,
            block_size: audio_constants::BLOCK_SIZE,
            pitch: Pitch::default(),
            excitation: ExcitationKind::default(),
            response_mode: ResponseMode::default(),
            noise_level: 0.0,
            smoothing_level: 0.0,
            bow_velocity: 0.5,
            bow_force: 0.5,
        }
    }
}

impl SynthesizerConfig {
    /// Seconds per block at the configured sample rate
    pub fn block_duration_s(&self) -> f64 {
        self.block_size as f64 / self.sample_rate_hz as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if !self.block_size.is_power_of_two() || self.block_size < audio_constants::MIN_BLOCK_SIZE
        {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        self.pitch.validate()?;
        check_level("noise_level", self.noise_level)?;
        check_level("smoothing_level", self.smoothing_level)?;
        check_level("bow_velocity", self.bow_velocity)?;
        check_level("bow_force", self.bow_force)?;
        Ok(())
    }
}

pub(crate) fn check_level(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::LevelOutOfRange { name, value })
    }
}
