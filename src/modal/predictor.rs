//! Four-zone modal predictor.
//!
//! Zone 1 (< 1 kHz) holds the named body modes, zone 2 (1-2.5 kHz) a dense
//! statistical floor, zone 3 (2.5-5 kHz) the bridge hill and zone 4 (> 5 kHz)
//! the high-frequency decay. Each zone scales its base frequencies with its
//! own combination of the three shift factors.

use super::Mode;
use crate::geometry::GeometryFeatures;
use crate::params::{CalibrationConstants, MaterialParams};

/// Hard bounds of the volume shift (air mode)
const VOLUME_SHIFT_RANGE: (f64, f64) = (0.6, 1.4);

/// Hard bounds of the bending shift (plate modes)
const BENDING_SHIFT_RANGE: (f64, f64) = (0.5, 2.0);

/// Weight of the top plate in the material shift (back gets the rest)
const TOP_MATERIAL_WEIGHT: f64 = 0.6;

/// Fraction of the material shift felt by the air mode
const AIR_MATERIAL_COUPLING: f64 = 0.2;

/// Zone 1: (base frequency Hz, amplitude, damping)
const AIR_MODE: (f64, f64, f64) = (275.0, 1.0, 0.02); // A0
const PLATE_MODES: [(f64, f64, f64); 2] = [
    (450.0, 0.8, 0.03), // B1-
    (550.0, 0.9, 0.03), // B1+
];

/// Zone 2: statistical mixing floor
const MIXING_BASE_HZ: [f64; 7] = [700.0, 800.0, 950.0, 1100.0, 1250.0, 1400.0, 1600.0];
const MIXING_SCALE: f64 = 1.5;
const MIXING_AMPLITUDE: f64 = 0.15;
const MIXING_DAMPING: f64 = 0.08;

/// Zone 3: bridge hill
const HILL_MODE_COUNT: usize = 8;
const HILL_BASE_RANGE_HZ: (f64, f64) = (2500.0, 4500.0);
const HILL_CENTER_HZ: f64 = 3000.0;
const HILL_WIDTH_HZ: f64 = 1200.0;
const HILL_FLOOR_AMPLITUDE: f64 = 0.1;
const HILL_PEAK_AMPLITUDE: f64 = 0.5;
const HILL_DAMPING: f64 = 0.06;

/// Zone 4: high-frequency decay
const DECAY_BASE_HZ: [f64; 3] = [5500.0, 6500.0, 7800.0];
const DECAY_CORNER_HZ: f64 = 5000.0;
const DECAY_AMPLITUDE: f64 = 0.3;
const DECAY_DAMPING: f64 = 0.1;

/// Frequency shift factors for one geometry/material snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftFactors {
    /// Inverse square root of volume relative to the reference body
    pub volume: f64,
    /// Depth ratio times inverse square root of the area ratio
    pub bending: f64,
    /// Weighted top/back speed of sound relative to the reference material
    pub material: f64,
}

impl ShiftFactors {
    pub fn compute(
        features: &GeometryFeatures,
        material: &MaterialParams,
        calibration: &CalibrationConstants,
    ) -> Self {
        let volume = (calibration.reference_volume / features.volume())
            .sqrt()
            .clamp(VOLUME_SHIFT_RANGE.0, VOLUME_SHIFT_RANGE.1);

        let depth_ratio = features.depth / calibration.reference_depth;
        let area_ratio = features.area / calibration.reference_area;
        let bending = (depth_ratio / area_ratio.sqrt())
            .clamp(BENDING_SHIFT_RANGE.0, BENDING_SHIFT_RANGE.1);

        let speed = TOP_MATERIAL_WEIGHT * material.top_speed()
            + (1.0 - TOP_MATERIAL_WEIGHT) * material.back_speed();
        let material = speed / MaterialParams::reference_speed();

        Self {
            volume,
            bending,
            material,
        }
    }

    /// Combined shift applied to plate-driven zones
    pub fn plate(&self) -> f64 {
        self.bending * self.material
    }
}

/// Maps geometry features and materials to a mode list
#[derive(Debug, Clone, Default)]
pub struct ModalPredictor {
    calibration: CalibrationConstants,
}

impl ModalPredictor {
    pub fn new(calibration: CalibrationConstants) -> Self {
        Self { calibration }
    }

    /// Predict the body modes, grouped zone by zone.
    ///
    /// Degenerate geometry (no enclosed area or no depth) yields an empty
    /// list, which downstream renders as silence or the bare radiation floor.
    pub fn predict(&self, features: &GeometryFeatures, material: &MaterialParams) -> Vec<Mode> {
        if !features.is_valid() {
            return Vec::new();
        }
        let shifts = ShiftFactors::compute(features, material, &self.calibration);

        let mut modes = Vec::with_capacity(
            1 + PLATE_MODES.len() + MIXING_BASE_HZ.len() + HILL_MODE_COUNT + DECAY_BASE_HZ.len(),
        );
        body_modes(&shifts, &mut modes);
        mixing_modes(&shifts, &mut modes);
        bridge_hill_modes(&shifts, &mut modes);
        decay_modes(&shifts, &mut modes);
        modes
    }
}

fn body_modes(shifts: &ShiftFactors, modes: &mut Vec<Mode>) {
    let (air_hz, air_amp, air_damping) = AIR_MODE;
    let air_material = 1.0 + AIR_MATERIAL_COUPLING * (shifts.material - 1.0);
    modes.push(Mode::new(
        air_hz * shifts.volume * air_material,
        air_amp,
        air_damping,
    ));

    for (hz, amp, damping) in PLATE_MODES {
        modes.push(Mode::new(hz * shifts.plate(), amp, damping));
    }
}

fn mixing_modes(shifts: &ShiftFactors, modes: &mut Vec<Mode>) {
    let scale = MIXING_SCALE * shifts.plate();
    modes.extend(
        MIXING_BASE_HZ
            .iter()
            .map(|hz| Mode::new(hz * scale, MIXING_AMPLITUDE, MIXING_DAMPING)),
    );
}

fn bridge_hill_modes(shifts: &ShiftFactors, modes: &mut Vec<Mode>) {
    let (lo, hi) = HILL_BASE_RANGE_HZ;
    let step = (hi - lo) / (HILL_MODE_COUNT - 1) as f64;
    for i in 0..HILL_MODE_COUNT {
        let frequency = (lo + step * i as f64) * shifts.plate();
        // The bump stays centered on the fixed hill frequency while the modes move
        let offset = (frequency - HILL_CENTER_HZ) / HILL_WIDTH_HZ;
        let amplitude = HILL_FLOOR_AMPLITUDE + HILL_PEAK_AMPLITUDE * (-offset * offset).exp();
        modes.push(Mode::new(frequency, amplitude, HILL_DAMPING));
    }
}

fn decay_modes(shifts: &ShiftFactors, modes: &mut Vec<Mode>) {
    for hz in DECAY_BASE_HZ {
        let frequency = hz * shifts.plate();
        let amplitude = DECAY_AMPLITUDE / (1.0 + (frequency / DECAY_CORNER_HZ).powi(4));
        modes.push(Mode::new(frequency, amplitude, DECAY_DAMPING));
    }
}
