//! Plate material parameters.

use crate::error::ConfigError;

/// Reference wood density (kg/m³) the modal laws are calibrated against.
pub const REFERENCE_DENSITY: f64 = 450.0;

/// Reference stiffness modulus (GPa) the modal laws are calibrated against.
pub const REFERENCE_MODULUS: f64 = 10.0;

/// Density and stiffness of the top and back plates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Top plate density (kg/m³)
    /// UI range: 300..850
    pub top_density: f64,

    /// Top plate longitudinal modulus (GPa)
    /// UI range: 5.0..20.0
    pub top_modulus: f64,

    /// Back plate density (kg/m³)
    pub back_density: f64,

    /// Back plate longitudinal modulus (GPa)
    pub back_modulus: f64,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            top_density: 400.0, // Spruce
            top_modulus: 12.0,
            back_density: 600.0, // Maple
            back_modulus: 10.0,
        }
    }
}

impl MaterialParams {
    /// Speed-of-sound proxy `sqrt(E/rho)` for the top plate
    pub fn top_speed(&self) -> f64 {
        (self.top_modulus / self.top_density).sqrt()
    }

    /// Speed-of-sound proxy `sqrt(E/rho)` for the back plate
    pub fn back_speed(&self) -> f64 {
        (self.back_modulus / self.back_density).sqrt()
    }

    /// Speed-of-sound proxy of the reference material
    pub fn reference_speed() -> f64 {
        (REFERENCE_MODULUS / REFERENCE_DENSITY).sqrt()
    }

    /// All four values must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("top_density", self.top_density),
            ("top_modulus", self.top_modulus),
            ("back_density", self.back_density),
            ("back_modulus", self.back_modulus),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveMaterial { name, value });
            }
        }
        Ok(())
    }
}
