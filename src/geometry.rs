//! Geometry feature extraction from editor control points.
//!
//! Runs on every drag frame of the outline and arching editors, so nothing
//! here fails: degenerate input resolves to a documented fallback value.

use crate::params::CalibrationConstants;

/// Half-widths closer than this to the symmetry axis are treated as lying on it
/// (canvas units). Used when searching for the C-bout waist.
const AXIS_TOLERANCE: f64 = 10.0;

/// Waist width reported when no outline point lies off the axis (canvas units)
pub const FALLBACK_WAIST_WIDTH: f64 = 100.0;

/// Symmetry axis of the default outline (canvas x coordinate)
pub const DEFAULT_AXIS_X: f64 = 75.0;

/// A point on the design canvas
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Scalar body features the modal predictor works from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryFeatures {
    /// Enclosed body area, both halves (canvas units²)
    pub area: f64,

    /// Top arch height + back arch height (canvas units)
    pub depth: f64,

    /// C-bout waist half-width measured from the axis (canvas units)
    pub width_reference: f64,
}

impl GeometryFeatures {
    /// Body volume estimate used by the air-mode law
    pub fn volume(&self) -> f64 {
        self.area * self.depth
    }

    /// True when the features describe a body that can resonate at all
    pub fn is_valid(&self) -> bool {
        self.area > 0.0 && self.depth > 0.0 && self.width_reference > 0.0
    }
}

/// Shoelace area of the half outline, closed along the symmetry axis.
///
/// The outline is one half of the body, traced from the top block to the
/// bottom block; the polygon is closed by projecting both end points onto
/// `axis_x`. Returns the absolute area, or 0 for fewer than 3 points.
pub fn half_outline_area(outline: &[Point], axis_x: f64) -> f64 {
    if outline.len() < 3 {
        return 0.0;
    }
    let (Some(first), Some(last)) = (outline.first(), outline.last()) else {
        return 0.0;
    };

    let closed = outline
        .iter()
        .map(|p| (p.x - axis_x, p.y))
        .chain([(0.0, last.y), (0.0, first.y)]);
    let shifted: Vec<(f64, f64)> = closed.collect();

    let twice_area: f64 = shifted
        .iter()
        .zip(shifted.iter().cycle().skip(1))
        .map(|((x1, y1), (x2, y2))| x1 * y2 - x2 * y1)
        .sum();

    (twice_area / 2.0).abs()
}

/// Height of an arch profile: max minus min of the elevation coordinate.
///
/// The arching editor draws profiles vertically, so elevation is `x` and the
/// longitudinal position is `y`. An empty profile yields `fallback`.
pub fn arch_height(profile: &[Point], fallback: f64) -> f64 {
    let mut iter = profile.iter().map(|p| p.x);
    let Some(first) = iter.next() else {
        return fallback;
    };
    let (min, max) = iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
    max - min
}

/// Narrowest half-width of the outline away from the axis (the C-bout waist).
pub fn waist_width(outline: &[Point], axis_x: f64) -> f64 {
    outline
        .iter()
        .map(|p| (p.x - axis_x).abs())
        .filter(|w| *w > AXIS_TOLERANCE)
        .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |m| m.min(w))))
        .unwrap_or(FALLBACK_WAIST_WIDTH)
}

/// Sample a cubic Bézier segment at `samples` evenly spaced parameters.
///
/// B(t) = (1-t)³P0 + 3(1-t)²t P1 + 3(1-t)t² P2 + t³P3
pub fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, samples: usize) -> Vec<Point> {
    if samples == 0 {
        return Vec::new();
    }
    if samples == 1 {
        return vec![p0];
    }
    (0..samples)
        .map(|i| {
            let t = i as f64 / (samples - 1) as f64;
            let u = 1.0 - t;
            let b0 = u * u * u;
            let b1 = 3.0 * u * u * t;
            let b2 = 3.0 * u * t * t;
            let b3 = t * t * t;
            Point::new(
                b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
                b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
            )
        })
        .collect()
}

/// Reduces outline and arch control points to `GeometryFeatures`
#[derive(Debug, Clone)]
pub struct GeometryExtractor {
    /// Symmetry axis of the outline (canvas x)
    pub axis_x: f64,
    calibration: CalibrationConstants,
}

impl Default for GeometryExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_AXIS_X, CalibrationConstants::default())
    }
}

impl GeometryExtractor {
    pub fn new(axis_x: f64, calibration: CalibrationConstants) -> Self {
        Self {
            axis_x,
            calibration,
        }
    }

    /// Extract features from the half outline and both arch profiles
    pub fn extract(
        &self,
        outline: &[Point],
        top_arch: &[Point],
        back_arch: &[Point],
    ) -> GeometryFeatures {
        let fallback = self.calibration.fallback_arch_height;
        GeometryFeatures {
            area: 2.0 * half_outline_area(outline, self.axis_x),
            depth: arch_height(top_arch, fallback) + arch_height(back_arch, fallback),
            width_reference: waist_width(outline, self.axis_x),
        }
    }
}

/// Ten-point half outline the outline editor starts with
///
/// Upper bout P0..P3, C-bout P3..P6, lower bout P6..P9.
pub fn default_outline() -> Vec<Point> {
    [
        (150.0, 50.0),  // Top block
        (170.0, 90.0),  // Upper bout
        (195.0, 140.0), // Upper bout
        (150.0, 220.0), // Upper corner
        (130.0, 250.0), // C-bout
        (130.0, 310.0), // C-bout
        (150.0, 340.0), // Lower corner
        (200.0, 400.0), // Lower bout
        (210.0, 480.0), // Lower bout
        (150.0, 550.0), // Bottom block
    ]
    .into_iter()
    .map(Point::from)
    .collect()
}

/// Five-point top arch profile the arching editor starts with
pub fn default_top_arch() -> Vec<Point> {
    [
        (200.0, 50.0),
        (150.0, 150.0),
        (140.0, 300.0),
        (150.0, 450.0),
        (200.0, 550.0),
    ]
    .into_iter()
    .map(Point::from)
    .collect()
}

/// Five-point back arch profile the arching editor starts with
pub fn default_back_arch() -> Vec<Point> {
    [
        (400.0, 50.0),
        (450.0, 150.0),
        (460.0, 300.0),
        (450.0, 450.0),
        (400.0, 550.0),
    ]
    .into_iter()
    .map(Point::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_square_area() {
        // Half outline of a 2x1 rectangle around the axis x = 0
        let outline = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!((half_outline_area(&outline, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_area_is_orientation_independent() {
        let mut outline = default_outline();
        let forward = half_outline_area(&outline, DEFAULT_AXIS_X);
        outline.reverse();
        let backward = half_outline_area(&outline, DEFAULT_AXIS_X);
        assert!((forward - backward).abs() < 1e-9);
        assert!(forward > 0.0);
    }

    #[test]
    fn test_degenerate_outline_has_zero_area() {
        assert_eq!(half_outline_area(&[], 0.0), 0.0);
        let two_points = [Point::new(1.0, 1.0), Point::new(2.0, 3.0)];
        assert_eq!(half_outline_area(&two_points, 0.0), 0.0);
    }

    #[test]
    fn test_arch_height_and_fallback() {
        assert_eq!(arch_height(&default_top_arch(), 99.0), 60.0);
        assert_eq!(arch_height(&default_back_arch(), 99.0), 60.0);
        assert_eq!(arch_height(&[], 99.0), 99.0);
        assert_eq!(arch_height(&[Point::new(5.0, 5.0)], 99.0), 0.0);
    }

    #[test]
    fn test_waist_width() {
        assert_eq!(waist_width(&default_outline(), DEFAULT_AXIS_X), 55.0);
        // Every point on the axis: nothing to measure
        let on_axis = [Point::new(75.0, 0.0), Point::new(80.0, 10.0)];
        assert_eq!(waist_width(&on_axis, DEFAULT_AXIS_X), FALLBACK_WAIST_WIDTH);
    }

    #[test]
    fn test_default_geometry_matches_calibration() {
        let calibration = CalibrationConstants::default();
        let features = GeometryExtractor::default().extract(
            &default_outline(),
            &default_top_arch(),
            &default_back_arch(),
        );
        assert!((features.area - calibration.reference_area).abs() < 1e-6);
        assert!((features.depth - calibration.reference_depth).abs() < 1e-9);
        assert!((features.volume() - calibration.reference_volume).abs() < 1e-3);
        assert!(features.is_valid());
    }

    #[test]
    fn test_empty_outline_features_are_invalid() {
        let features = GeometryExtractor::default().extract(&[], &[], &[]);
        assert_eq!(features.area, 0.0);
        assert!(!features.is_valid());
    }

    #[test]
    fn test_cubic_bezier_endpoints() {
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(3.0, 3.0);
        let curve = cubic_bezier(p0, Point::new(1.0, 0.0), Point::new(2.0, 3.0), p3, 11);
        assert_eq!(curve.len(), 11);
        assert_eq!(curve[0], p0);
        assert!((curve[10].x - p3.x).abs() < 1e-12);
        assert!((curve[10].y - p3.y).abs() < 1e-12);
    }

    #[test]
    fn test_bezier_densified_outline_keeps_area_close() {
        // A straight-control-point Bézier is the chord itself
        let a = Point::new(75.0, 0.0);
        let b = Point::new(175.0, 0.0);
        let c = Point::new(175.0, 100.0);
        let mut outline = cubic_bezier(a, a, b, b, 8);
        outline.extend(cubic_bezier(b, b, c, c, 8).into_iter().skip(1));
        outline.push(Point::new(75.0, 100.0));
        assert!((half_outline_area(&outline, 75.0) - 10_000.0).abs() < 1e-6);
    }
}
