//! Parameter definitions with physical units and documented semantics.
//!
//! All tuning constants are collected here with:
//! - Physical units (Hz, seconds, design-canvas units, kg/m³, GPa)
//! - Documented ranges and meanings
//! - Validation at the boundary where the UI hands values in

mod calibration;
mod material;
mod recording;
mod spectrum;
mod synth;

// Re-export all types
pub use calibration::CalibrationConstants;
pub use material::{MaterialParams, REFERENCE_DENSITY, REFERENCE_MODULUS};
pub use recording::RecordingConfig;
pub use spectrum::SpectrumRange;
pub use synth::{
    audio_constants, ExcitationKind, MelodyStep, Pitch, ResponseMode, StringPreset,
    SynthesizerConfig,
};
pub(crate) use synth::check_level;
