//! Violin acoustics library - body modes, response curves and real-time
//! bowed-string synthesis.

pub mod audio;
pub mod error;
pub mod excitation;
pub mod geometry;
pub mod modal;
pub mod params;
pub mod reference;
pub mod response;
pub mod smoothing;
pub mod spectrum;
