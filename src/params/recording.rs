//! Offline recording configuration.

use std::path::PathBuf;

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output WAV file
    pub output_path: PathBuf,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_path: PathBuf::from("recording.wav"),
        }
    }

    /// Total number of audio frames to render at `sample_rate_hz`
    pub fn total_frames(&self, sample_rate_hz: u32) -> usize {
        (self.duration_secs.max(0.0) * sample_rate_hz as f32).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames_rounds_up() {
        let config = RecordingConfig::new(0.5);
        assert_eq!(config.total_frames(44100), 22050);

        let config = RecordingConfig::new(0.25);
        assert_eq!(config.total_frames(10), 3);
    }
}
