//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use violin_acoustics::params::{
    ExcitationKind, MaterialParams, Pitch, RecordingConfig, ResponseMode, StringPreset,
    SynthesizerConfig,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "violin-acoustics")]
#[command(about = "Violin body modes, response curves and bowed-string synthesis", long_about = None)]
pub struct Args {
    /// String preset: g3 (default), d4, a4, e5, sibelius
    #[arg(long, value_name = "PRESET", default_value = "g3")]
    pub string: String,

    /// Fixed fundamental frequency, overrides --string (Hz)
    #[arg(long, value_name = "HZ")]
    pub frequency: Option<f32>,

    /// Excitation model: sawtooth (default), waveguide, fdtd
    #[arg(long, value_name = "MODEL", default_value = "sawtooth")]
    pub excitation: String,

    /// Body response: model (default), flat, sampled, noisy
    #[arg(long, value_name = "MODE", default_value = "model")]
    pub response: String,

    /// Random perturbation for the noisy response (0..1)
    #[arg(long, value_name = "LEVEL", default_value = "0")]
    pub noise: f32,

    /// Curve smoothing (0..1)
    #[arg(long, value_name = "LEVEL", default_value = "0")]
    pub smoothing: f32,

    /// Bow velocity (0..1)
    #[arg(long, value_name = "LEVEL", default_value = "0.5")]
    pub bow_velocity: f32,

    /// Bow force (0..1)
    #[arg(long, value_name = "LEVEL", default_value = "0.5")]
    pub bow_force: f32,

    /// Top plate density (kg/m³)
    #[arg(long, value_name = "KG_M3", default_value = "400")]
    pub top_density: f64,

    /// Top plate modulus (GPa)
    #[arg(long, value_name = "GPA", default_value = "12")]
    pub top_modulus: f64,

    /// Back plate density (kg/m³)
    #[arg(long, value_name = "KG_M3", default_value = "600")]
    pub back_density: f64,

    /// Back plate modulus (GPa)
    #[arg(long, value_name = "GPA", default_value = "10")]
    pub back_modulus: f64,

    /// Measured reference response table (comma-separated dB values)
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Print the predicted mode table
    #[arg(long)]
    pub modes: bool,

    /// Print the response curve as frequency/dB pairs
    #[arg(long)]
    pub spectrum: bool,

    /// Play through the default output device (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub play: Option<f32>,

    /// Render offline to a WAV file (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// WAV file written by --record
    #[arg(long, value_name = "PATH", default_value = "recording.wav")]
    pub output: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Parse the fundamental from --frequency or the string preset
    pub fn parse_pitch(&self) -> Pitch {
        if let Some(hz) = self.frequency {
            info!("Pitch: fixed {} Hz", hz);
            return Pitch::Fixed(hz);
        }
        match StringPreset::from_name(&self.string) {
            Some(preset) => {
                info!("Pitch: {} string preset", preset.name());
                preset.pitch()
            }
            None => {
                warn!("Unknown string preset '{}', using g3", self.string);
                StringPreset::G3.pitch()
            }
        }
    }

    pub fn parse_excitation(&self) -> ExcitationKind {
        ExcitationKind::from_name(&self.excitation).unwrap_or_else(|| {
            warn!("Unknown excitation '{}', using sawtooth", self.excitation);
            ExcitationKind::Sawtooth
        })
    }

    pub fn parse_response_mode(&self) -> ResponseMode {
        ResponseMode::from_name(&self.response).unwrap_or_else(|| {
            warn!("Unknown response mode '{}', using model", self.response);
            ResponseMode::Model
        })
    }

    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            top_density: self.top_density,
            top_modulus: self.top_modulus,
            back_density: self.back_density,
            back_modulus: self.back_modulus,
        }
    }

    /// Synthesizer configuration from the flags (validated by the engine)
    pub fn synth_config(&self) -> SynthesizerConfig {
        SynthesizerConfig {
            pitch: self.parse_pitch(),
            excitation: self.parse_excitation(),
            response_mode: self.parse_response_mode(),
            noise_level: self.noise,
            smoothing_level: self.smoothing,
            bow_velocity: self.bow_velocity,
            bow_force: self.bow_force,
            ..SynthesizerConfig::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| RecordingConfig {
            duration_secs: duration,
            output_path: self.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let args = Args::parse_from(["violin-acoustics"]);
        assert_eq!(args.synth_config(), SynthesizerConfig::default());
        assert_eq!(args.material(), MaterialParams::default());
        assert!(args.create_recording_config().is_none());
    }

    #[test]
    fn test_frequency_overrides_preset() {
        let args = Args::parse_from(["violin-acoustics", "--string", "a4", "--frequency", "123"]);
        assert_eq!(args.parse_pitch(), Pitch::Fixed(123.0));
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let args = Args::parse_from([
            "violin-acoustics",
            "--string",
            "c2",
            "--excitation",
            "pluck",
            "--response",
            "weird",
        ]);
        assert_eq!(args.parse_pitch(), StringPreset::G3.pitch());
        assert_eq!(args.parse_excitation(), ExcitationKind::Sawtooth);
        assert_eq!(args.parse_response_mode(), ResponseMode::Model);
    }

    #[test]
    fn test_recording_flags() {
        let args = Args::parse_from([
            "violin-acoustics",
            "--record",
            "2.5",
            "--output",
            "take.wav",
            "-vv",
        ]);
        let recording = args.create_recording_config().unwrap();
        assert_eq!(recording.duration_secs, 2.5);
        assert_eq!(recording.output_path, PathBuf::from("take.wav"));
        assert_eq!(args.verbose, 2);
    }
}
