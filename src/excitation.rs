//! Excitation sources: bowed-string analogues feeding the body filter.
//!
//! Each source owns its state exclusively and advances it once per
//! `generate` call. The engine keeps one instance of every variant and runs
//! all of them every block; only the selected one is heard.

mod fdtd;
mod oscillator;
mod waveguide;

pub use fdtd::FdtdString;
pub use oscillator::SawtoothOscillator;
pub use waveguide::BowedWaveguide;

use crate::params::ExcitationKind;

/// One block of raw excitation per call
pub trait ExcitationSource: Send {
    /// Fill `out` with the next `out.len()` samples.
    ///
    /// `bow_velocity` and `bow_force` are control values in [0, 1].
    fn generate(
        &mut self,
        out: &mut [f32],
        frequency_hz: f32,
        sample_rate_hz: f32,
        bow_velocity: f32,
        bow_force: f32,
    );

    /// Return to the silent initial state
    fn reset(&mut self);
}

/// Create a fresh source of the given kind
pub fn create(kind: ExcitationKind) -> Box<dyn ExcitationSource> {
    match kind {
        ExcitationKind::Sawtooth => Box::new(SawtoothOscillator::new()),
        ExcitationKind::Waveguide => Box::new(BowedWaveguide::new()),
        ExcitationKind::Fdtd => Box::new(FdtdString::new()),
    }
}

/// One persistent instance of every excitation variant
pub struct ExcitationBank {
    sources: Vec<Box<dyn ExcitationSource>>,
    /// Output of the sources nobody is listening to
    scratch: Vec<f32>,
}

impl Default for ExcitationBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcitationBank {
    pub fn new() -> Self {
        Self {
            sources: ExcitationKind::ALL.into_iter().map(create).collect(),
            scratch: Vec::new(),
        }
    }

    /// Bank whose scratch buffer already fits `block_size` samples
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            scratch: vec![0.0; block_size],
            ..Self::new()
        }
    }

    pub fn get_mut(&mut self, kind: ExcitationKind) -> &mut dyn ExcitationSource {
        self.sources[kind.index()].as_mut()
    }

    /// Advance every source by `out.len()` samples.
    ///
    /// `selected` writes into `out`; the rest keep integrating into a
    /// discarded buffer. The scratch buffer only grows when the block does.
    pub fn generate(
        &mut self,
        selected: ExcitationKind,
        out: &mut [f32],
        frequency_hz: f32,
        sample_rate_hz: f32,
        bow_velocity: f32,
        bow_force: f32,
    ) {
        self.scratch.resize(out.len(), 0.0);
        for kind in ExcitationKind::ALL {
            let target = if kind == selected {
                &mut *out
            } else {
                self.scratch.as_mut_slice()
            };
            self.sources[kind.index()].generate(
                target,
                frequency_hz,
                sample_rate_hz,
                bow_velocity,
                bow_force,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn peak(kind: ExcitationKind, frequency: f32, velocity: f32, force: f32, blocks: usize) -> f32 {
        let mut source = create(kind);
        let mut block = [0.0f32; 64];
        let mut peak = 0.0f32;
        for _ in 0..blocks {
            source.generate(&mut block, frequency, SAMPLE_RATE, velocity, force);
            for s in block {
                assert!(s.is_finite());
                peak = peak.max(s.abs());
            }
        }
        peak
    }

    #[test]
    fn test_excited_sources_stay_bounded_without_bow_force() {
        for kind in ExcitationKind::ALL {
            let mut source = create(kind);
            let mut block = [0.0f32; 64];
            for _ in 0..200 {
                source.generate(&mut block, 196.0, SAMPLE_RATE, 1.0, 1.0);
            }

            // Peak per run of 100 blocks, so every window spans whole periods
            let mut window_peaks = Vec::new();
            let mut window_peak = 0.0f32;
            for i in 1..=10_000 {
                source.generate(&mut block, 196.0, SAMPLE_RATE, 0.5, 0.0);
                for s in block {
                    assert!(s.is_finite(), "{kind:?}");
                    window_peak = window_peak.max(s.abs());
                }
                if i % 100 == 0 {
                    window_peaks.push(window_peak);
                    window_peak = 0.0;
                }
            }

            let first = window_peaks[0];
            assert!(first <= 2.0, "{kind:?}: {first}");
            for later in &window_peaks[1..] {
                assert!(*later <= first * 1.05 + 1e-6, "{kind:?}: {later} > {first}");
            }
        }
    }

    #[test]
    fn test_sources_stay_bounded_under_full_bow() {
        for kind in ExcitationKind::ALL {
            assert!(peak(kind, 440.0, 1.0, 1.0, 10_000) < 1.0e4, "{kind:?}");
        }
    }

    #[test]
    fn test_sources_produce_sound_when_bowed() {
        for kind in ExcitationKind::ALL {
            assert!(peak(kind, 196.0, 0.8, 0.8, 200) > 1.0e-3, "{kind:?}");
        }
    }

    #[test]
    fn test_unselected_sources_keep_integrating() {
        let mut bank = ExcitationBank::new();
        let mut reference = SawtoothOscillator::new();
        let mut block = [0.0f32; 64];
        let mut expected = [0.0f32; 64];

        bank.generate(ExcitationKind::Fdtd, &mut block, 196.0, SAMPLE_RATE, 1.0, 1.0);
        reference.generate(&mut expected, 196.0, SAMPLE_RATE, 1.0, 1.0);

        bank.generate(ExcitationKind::Sawtooth, &mut block, 196.0, SAMPLE_RATE, 1.0, 1.0);
        reference.generate(&mut expected, 196.0, SAMPLE_RATE, 1.0, 1.0);
        assert_eq!(block, expected);
    }

    #[test]
    fn test_bank_keeps_state_per_variant() {
        let mut bank = ExcitationBank::new();
        let mut block = [0.0f32; 64];
        bank.get_mut(ExcitationKind::Sawtooth)
            .generate(&mut block, 196.0, SAMPLE_RATE, 1.0, 1.0);
        let first = block;
        bank.get_mut(ExcitationKind::Fdtd)
            .generate(&mut block, 196.0, SAMPLE_RATE, 1.0, 1.0);
        bank.get_mut(ExcitationKind::Sawtooth)
            .generate(&mut block, 196.0, SAMPLE_RATE, 1.0, 1.0);
        // Phase continued rather than restarting
        assert_ne!(block, first);
    }
}
