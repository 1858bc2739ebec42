//! Real-time synthesis engine and spectrogram analysis.
//!
//! Each block runs excitation → body filter → high-pass → normalize/limit,
//! then goes to the output device and to a bounded queue for visualization.

mod analysis;
mod filter;
mod processor;
mod system;

// Re-export public types
pub use analysis::{hann_window, BlockAnalyzer};
pub use filter::{HighPass, SpectralFilter, HIGH_PASS_CORNER_HZ, TARGET_RMS};
pub use processor::{BlockProcessor, EngineSnapshot};
pub use system::{write_wav, Synthesizer};
