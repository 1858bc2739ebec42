//! Acoustic model holding the current geometry and material together.

use std::sync::Arc;

use super::{ModalPredictor, Mode};
use crate::error::ConfigError;
use crate::geometry::{
    default_back_arch, default_outline, default_top_arch, GeometryExtractor, GeometryFeatures,
    Point,
};
use crate::params::{CalibrationConstants, MaterialParams};

/// Current body design: outline, arches and plate materials.
///
/// Every prediction reads geometry and material from this one place, so a
/// published mode list never mixes a new material with stale geometry.
#[derive(Debug, Clone)]
pub struct AcousticModel {
    outline: Vec<Point>,
    top_arch: Vec<Point>,
    back_arch: Vec<Point>,
    material: MaterialParams,
    extractor: GeometryExtractor,
    predictor: ModalPredictor,
}

impl Default for AcousticModel {
    fn default() -> Self {
        Self::new(GeometryExtractor::default(), CalibrationConstants::default())
    }
}

impl AcousticModel {
    /// Start from the editors' default geometry and default materials
    pub fn new(extractor: GeometryExtractor, calibration: CalibrationConstants) -> Self {
        Self {
            outline: default_outline(),
            top_arch: default_top_arch(),
            back_arch: default_back_arch(),
            material: MaterialParams::default(),
            extractor,
            predictor: ModalPredictor::new(calibration),
        }
    }

    /// Replace the half outline (any point count, degenerate allowed)
    pub fn set_outline(&mut self, outline: Vec<Point>) {
        self.outline = outline;
    }

    /// Replace both arch profiles
    pub fn set_arches(&mut self, top_arch: Vec<Point>, back_arch: Vec<Point>) {
        self.top_arch = top_arch;
        self.back_arch = back_arch;
    }

    /// Replace the plate materials; invalid values leave the previous ones in place
    pub fn set_material(&mut self, material: MaterialParams) -> Result<(), ConfigError> {
        material.validate()?;
        self.material = material;
        Ok(())
    }

    pub fn material(&self) -> MaterialParams {
        self.material
    }

    pub fn features(&self) -> GeometryFeatures {
        self.extractor
            .extract(&self.outline, &self.top_arch, &self.back_arch)
    }

    /// Predict a fresh, immutable mode list from the current snapshot
    pub fn predict(&self) -> Arc<[Mode]> {
        self.predictor.predict(&self.features(), &self.material).into()
    }
}
