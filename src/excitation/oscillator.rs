//! Band-limited sawtooth approximating Helmholtz motion.

use super::ExcitationSource;

/// Taps of the boxcar smoothing kernel (current sample plus history)
const BOXCAR_TAPS: usize = 4;

/// Pole radius of the DC blocker
const DC_BLOCKER_POLE: f32 = 0.995;

/// Phase-accumulating sawtooth with boxcar smoothing and DC blocking
#[derive(Debug, Clone, Default)]
pub struct SawtoothOscillator {
    /// Normalized phase in [0, 1)
    phase: f32,
    history: [f32; BOXCAR_TAPS - 1],
    dc_x1: f32,
    dc_y1: f32,
}

impl SawtoothOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    fn smooth(&mut self, raw: f32) -> f32 {
        let sum: f32 = raw + self.history.iter().sum::<f32>();
        self.history.rotate_right(1);
        self.history[0] = raw;
        sum / BOXCAR_TAPS as f32
    }

    fn block_dc(&mut self, x: f32) -> f32 {
        let y = x - self.dc_x1 + DC_BLOCKER_POLE * self.dc_y1;
        self.dc_x1 = x;
        self.dc_y1 = y;
        y
    }
}

impl ExcitationSource for SawtoothOscillator {
    fn generate(
        &mut self,
        out: &mut [f32],
        frequency_hz: f32,
        sample_rate_hz: f32,
        bow_velocity: f32,
        _bow_force: f32,
    ) {
        let increment = frequency_hz / sample_rate_hz;
        for sample in out.iter_mut() {
            let raw = 2.0 * self.phase - 1.0;
            self.phase = (self.phase + increment).rem_euclid(1.0);
            let smoothed = self.smooth(raw);
            *sample = self.block_dc(smoothed) * bow_velocity;
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_matches_frequency() {
        let mut osc = SawtoothOscillator::new();
        let mut block = vec![0.0f32; 4410];
        osc.generate(&mut block, 100.0, 44100.0, 1.0, 0.0);
        // One falling edge per period: 100 Hz over 0.1 s
        let edges = block
            .windows(3)
            .filter(|w| w[1] - w[0] >= -0.3 && w[2] - w[1] < -0.3)
            .count();
        assert!((9..=11).contains(&edges), "edges = {edges}");
    }

    #[test]
    fn test_velocity_scales_output() {
        let mut quiet = SawtoothOscillator::new();
        let mut loud = SawtoothOscillator::new();
        let mut a = [0.0f32; 256];
        let mut b = [0.0f32; 256];
        quiet.generate(&mut a, 220.0, 44100.0, 0.25, 0.0);
        loud.generate(&mut b, 220.0, 44100.0, 1.0, 0.0);
        for (x, y) in a.iter().zip(&b) {
            assert!((x * 4.0 - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_zero_velocity_is_silent() {
        let mut osc = SawtoothOscillator::new();
        let mut block = [1.0f32; 128];
        osc.generate(&mut block, 440.0, 44100.0, 0.0, 1.0);
        assert!(block.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_reset_restarts_phase() {
        let mut osc = SawtoothOscillator::new();
        let mut first = [0.0f32; 64];
        let mut again = [0.0f32; 64];
        osc.generate(&mut first, 440.0, 44100.0, 1.0, 0.0);
        osc.reset();
        osc.generate(&mut again, 440.0, 44100.0, 1.0, 0.0);
        assert_eq!(first, again);
    }
}
