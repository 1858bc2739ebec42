//! Finite-difference time-domain string.

use std::f32::consts::TAU;

use super::ExcitationSource;

/// Grid points along the string, both fixed ends included
const GRID_POINTS: usize = 64;

/// Per-step damping multiplier
const DAMPING: f32 = 0.999;

/// Bow contact, a quarter of the way along the string
const BOW_POSITION: usize = GRID_POINTS / 4;

/// Pickup next to the far (bridge) end
const PICKUP_POSITION: usize = GRID_POINTS - 2;

/// Driving force per unit of `bow_velocity * bow_force`
const DRIVE_GAIN: f32 = 0.005;

/// Lifts the pickup displacement to the level of the other sources
const OUTPUT_GAIN: f32 = 100.0;

/// Explicit scheme for the 1D wave equation with fixed ends:
///
/// u_next[i] = 2u[i] - u_prev[i] + r²(u[i+1] - 2u[i] + u[i-1])
#[derive(Debug, Clone)]
pub struct FdtdString {
    current: [f32; GRID_POINTS],
    previous: [f32; GRID_POINTS],
    /// Phase of the sinusoidal bow drive, in [0, 1)
    drive_phase: f32,
}

impl Default for FdtdString {
    fn default() -> Self {
        Self::new()
    }
}

impl FdtdString {
    pub fn new() -> Self {
        Self {
            current: [0.0; GRID_POINTS],
            previous: [0.0; GRID_POINTS],
            drive_phase: 0.0,
        }
    }

    /// Courant number for a fundamental, clamped to the stability limit of 1
    pub fn courant(frequency_hz: f32, sample_rate_hz: f32) -> f32 {
        let r = 2.0 * frequency_hz * (GRID_POINTS - 1) as f32 / sample_rate_hz;
        if r.is_finite() {
            r.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    fn step(&mut self, r_squared: f32, drive: f32) -> f32 {
        // `previous` is overwritten in place with the next time step
        for i in 1..GRID_POINTS - 1 {
            let u = self.current[i];
            let laplacian = self.current[i + 1] - 2.0 * u + self.current[i - 1];
            self.previous[i] = DAMPING * (2.0 * u - self.previous[i] + r_squared * laplacian);
        }
        self.previous[BOW_POSITION] += drive;
        self.previous[0] = 0.0;
        self.previous[GRID_POINTS - 1] = 0.0;
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current[PICKUP_POSITION]
    }
}

impl ExcitationSource for FdtdString {
    fn generate(
        &mut self,
        out: &mut [f32],
        frequency_hz: f32,
        sample_rate_hz: f32,
        bow_velocity: f32,
        bow_force: f32,
    ) {
        let r = Self::courant(frequency_hz, sample_rate_hz);
        let r_squared = r * r;
        let increment = frequency_hz / sample_rate_hz;
        let amplitude = bow_velocity * bow_force * DRIVE_GAIN;
        for sample in out.iter_mut() {
            let drive = amplitude * (TAU * self.drive_phase).sin();
            self.drive_phase = (self.drive_phase + increment).rem_euclid(1.0);
            *sample = self.step(r_squared, drive) * OUTPUT_GAIN;
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courant_is_clamped() {
        let r = FdtdString::courant(196.0, 44100.0);
        assert!((r - 2.0 * 196.0 * 63.0 / 44100.0).abs() < 1e-6);
        assert_eq!(FdtdString::courant(2000.0, 44100.0), 1.0);
        assert_eq!(FdtdString::courant(100.0, 0.0), 1.0);
    }

    #[test]
    fn test_ends_stay_fixed() {
        let mut string = FdtdString::new();
        let mut block = [0.0f32; 512];
        string.generate(&mut block, 330.0, 44100.0, 1.0, 1.0);
        assert_eq!(string.current[0], 0.0);
        assert_eq!(string.current[GRID_POINTS - 1], 0.0);
    }

    #[test]
    fn test_output_level_is_comparable_to_oscillator() {
        for frequency in [196.0, 440.0] {
            let mut string = FdtdString::new();
            let mut block = [0.0f32; 1024];
            let mut peak = 0.0f32;
            for _ in 0..43 {
                string.generate(&mut block, frequency, 44100.0, 0.8, 0.8);
                peak = block.iter().fold(peak, |m, s| m.max(s.abs()));
            }
            assert!(peak > 0.1 && peak < 2.0, "{frequency} Hz: peak {peak}");
        }
    }

    #[test]
    fn test_free_vibration_decays() {
        let mut string = FdtdString::new();
        let mut block = [0.0f32; 1024];
        for _ in 0..10 {
            string.generate(&mut block, 196.0, 44100.0, 1.0, 1.0);
        }
        let driven = string.current.iter().fold(0.0f32, |m, u| m.max(u.abs()));
        for _ in 0..40 {
            string.generate(&mut block, 196.0, 44100.0, 1.0, 0.0);
        }
        let free = string.current.iter().fold(0.0f32, |m, u| m.max(u.abs()));
        assert!(driven > 0.0);
        assert!(free < 0.01 * driven);
    }
}
