//! Digital waveguide string with a nonlinear bow contact.
//!
//! Two delay lines carry the right-going (upper) and left-going (lower)
//! travelling waves. Both ends reflect with sign inversion and a small loss;
//! the bridge reflection also passes through a one-pole low-pass. The bow
//! sits a quarter of the string length from the nut and injects a friction
//! force that depends on the relative bow/string velocity.

use super::ExcitationSource;

/// Delay line capacity per rail (samples); bounds the lowest playable pitch
const MAX_DELAY: usize = 2048;

/// Shortest usable rail length (samples)
const MIN_DELAY: usize = 4;

/// Gain applied at the nut reflection
const REFLECTION_LOSS: f32 = 0.995;

/// Gain applied at the bridge reflection
const BRIDGE_LOSS: f32 = 0.95;

/// Pole of the low-pass in the bridge reflection
const BRIDGE_POLE: f32 = 0.4;

/// Maps the 0..1 bow velocity control to string velocity units
const BOW_SPEED_SCALE: f32 = 0.2;

/// Sharpness of the sticking region around zero relative velocity
const FRICTION_SHARPNESS: f32 = 100.0;

/// Share of the friction carried by the dry (sliding) term
const DRY_FRICTION: f32 = 0.3;

/// Slope of the dry term's tanh transition at zero relative velocity
const DRY_TRANSITION: f32 = 20.0;

/// Output gain compensation
const OUTPUT_GAIN: f32 = 5.0;

/// Bowed string modelled with two travelling-wave delay lines
#[derive(Debug, Clone)]
pub struct BowedWaveguide {
    upper: Box<[f32]>,
    lower: Box<[f32]>,
    /// Ring offset of position 0 on each rail
    upper_head: usize,
    lower_head: usize,
    /// Bridge low-pass state
    bridge_state: f32,
}

impl Default for BowedWaveguide {
    fn default() -> Self {
        Self::new()
    }
}

impl BowedWaveguide {
    pub fn new() -> Self {
        Self {
            upper: vec![0.0; MAX_DELAY].into_boxed_slice(),
            lower: vec![0.0; MAX_DELAY].into_boxed_slice(),
            upper_head: 0,
            lower_head: 0,
            bridge_state: 0.0,
        }
    }

    /// Rail length for a fundamental: half the period, clamped to the buffer
    pub fn delay_length(frequency_hz: f32, sample_rate_hz: f32) -> usize {
        let length = sample_rate_hz / (2.0 * frequency_hz.max(f32::MIN_POSITIVE));
        if !length.is_finite() {
            return MAX_DELAY;
        }
        (length.round() as usize).clamp(MIN_DELAY, MAX_DELAY)
    }

    fn upper_index(&self, position: usize) -> usize {
        (self.upper_head + position) % MAX_DELAY
    }

    fn lower_index(&self, position: usize) -> usize {
        (self.lower_head + position) % MAX_DELAY
    }

    /// Advance both rails by one sample and return the bridge-end value
    fn step(&mut self, length: usize, bow_speed: f32, bow_force: f32) -> f32 {
        let upper_end = self.upper[self.upper_index(length - 1)];
        let lower_end = self.lower[self.lower_index(0)];

        // Upper moves toward the bridge, lower toward the nut
        self.upper_head = (self.upper_head + MAX_DELAY - 1) % MAX_DELAY;
        let nut = self.upper_index(0);
        self.upper[nut] = -REFLECTION_LOSS * lower_end;

        self.bridge_state = (1.0 - BRIDGE_POLE) * upper_end + BRIDGE_POLE * self.bridge_state;
        self.lower_head = (self.lower_head + 1) % MAX_DELAY;
        let bridge = self.lower_index(length - 1);
        self.lower[bridge] = -BRIDGE_LOSS * self.bridge_state;

        let bow = length / 4;
        let (ub, lb) = (self.upper_index(bow), self.lower_index(bow));
        let string_velocity = self.upper[ub] + self.lower[lb];
        let force = -bow_force * friction(string_velocity - bow_speed);
        self.upper[ub] += force;
        self.lower[lb] += force;

        self.upper[self.upper_index(length - 1)]
    }
}

/// Friction characteristic, odd in `relative_velocity` and zero at rest.
///
/// A Gaussian-windowed sticking term dominates near zero and a dry term
/// levels off at `DRY_FRICTION / DRY_TRANSITION` while sliding. The slope
/// at zero is 1 and `|friction(v)| <= |v|`, so the injected wave never
/// exceeds the velocity mismatch.
fn friction(relative_velocity: f32) -> f32 {
    let v = relative_velocity;
    let sticky = (1.0 - DRY_FRICTION) * v * (-FRICTION_SHARPNESS * v * v).exp();
    let dry = DRY_FRICTION / DRY_TRANSITION * (DRY_TRANSITION * v).tanh();
    sticky + dry
}

impl ExcitationSource for BowedWaveguide {
    fn generate(
        &mut self,
        out: &mut [f32],
        frequency_hz: f32,
        sample_rate_hz: f32,
        bow_velocity: f32,
        bow_force: f32,
    ) {
        let length = Self::delay_length(frequency_hz, sample_rate_hz);
        let bow_speed = bow_velocity * BOW_SPEED_SCALE;
        for sample in out.iter_mut() {
            *sample = self.step(length, bow_speed, bow_force) * OUTPUT_GAIN;
        }
    }

    fn reset(&mut self) {
        self.upper.fill(0.0);
        self.lower.fill(0.0);
        self.upper_head = 0;
        self.lower_head = 0;
        self.bridge_state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BlockAnalyzer;

    #[test]
    fn test_delay_length() {
        assert_eq!(BowedWaveguide::delay_length(441.0, 44100.0), 50);
        assert_eq!(BowedWaveguide::delay_length(1.0, 44100.0), MAX_DELAY);
        assert_eq!(BowedWaveguide::delay_length(20_000.0, 44100.0), MIN_DELAY);
        assert_eq!(BowedWaveguide::delay_length(0.0, 44100.0), MAX_DELAY);
    }

    #[test]
    fn test_friction_is_odd_and_bounded() {
        assert_eq!(friction(0.0), 0.0);
        for v in [0.01f32, 0.05, 0.1, 0.3, 1.0, 5.0] {
            assert!((friction(v) + friction(-v)).abs() < 1e-6);
            assert!(friction(v) > 0.0 && friction(v) <= v, "v = {v}");
        }
        // Sliding leaves only the dry term
        assert!((friction(1.0) - DRY_FRICTION / DRY_TRANSITION).abs() < 1e-6);
    }

    #[test]
    fn test_resting_bow_keeps_string_silent() {
        let mut string = BowedWaveguide::new();
        let mut block = [0.0f32; 1024];
        for _ in 0..43 {
            string.generate(&mut block, 196.0, 44100.0, 0.0, 1.0);
            assert!(block.iter().all(|s| *s == 0.0));
        }
    }

    #[test]
    fn test_bowed_string_sounds_at_its_pitch() {
        let sample_rate = 44100.0;
        let mut string = BowedWaveguide::new();
        let mut samples = vec![0.0f32; 44100];
        for block in samples.chunks_mut(1024) {
            string.generate(block, 196.0, sample_rate, 0.5, 0.5);
        }

        let mut analyzer = BlockAnalyzer::new(16384, sample_rate);
        let dominant = analyzer
            .dominant_frequency(&samples[samples.len() - 16384..])
            .unwrap();
        // The fundamental or one of the first few partials
        let partial = (dominant / 196.0).round();
        assert!((1.0..=3.0).contains(&partial), "dominant = {dominant}");
        assert!(
            (dominant - partial * 196.0).abs() <= 3.0 * analyzer.resolution_hz(),
            "dominant = {dominant}"
        );
    }

    #[test]
    fn test_unbowed_string_stays_silent() {
        let mut string = BowedWaveguide::new();
        let mut block = [0.0f32; 256];
        string.generate(&mut block, 196.0, 44100.0, 1.0, 0.0);
        assert!(block.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_released_string_decays() {
        let mut string = BowedWaveguide::new();
        let mut block = [0.0f32; 1024];
        for _ in 0..20 {
            string.generate(&mut block, 196.0, 44100.0, 1.0, 1.0);
        }
        let bowed = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(bowed > 0.0);
        for _ in 0..400 {
            string.generate(&mut block, 196.0, 44100.0, 1.0, 0.0);
        }
        let released = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(released < 0.1 * bowed);
    }
}
