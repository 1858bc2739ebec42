//! Reference constants converting design-canvas units into physical estimates.

/// Calibration of the modal shift laws.
///
/// Values are measured on the default editor geometry (see
/// `geometry::default_outline` and the default arches), so that the default
/// body predicts volume and bending shifts of exactly 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConstants {
    /// Full body area (canvas units²), both halves of the outline
    pub reference_area: f64,

    /// Combined top + back arch height (canvas units)
    pub reference_depth: f64,

    /// Body volume estimate `area * depth` (canvas units³)
    pub reference_volume: f64,

    /// Arch height substituted for an empty arch profile (canvas units)
    pub fallback_arch_height: f64,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            reference_area: 95_050.0,
            reference_depth: 120.0,
            reference_volume: 95_050.0 * 120.0,
            fallback_arch_height: 60.0,
        }
    }
}
