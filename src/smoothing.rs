//! Local polynomial (Savitzky-Golay) smoothing for response curves.

/// Largest window half-width, reached at smoothing level 1.0
const MAX_HALF_WIDTH: usize = 25;

/// Odd window length for a smoothing level in [0, 1].
///
/// Returns 1 (no smoothing) for levels that round to a window shorter than 5,
/// since a quadratic fit over 3 points reproduces its input. The window never
/// exceeds the largest odd length that fits in `len` samples.
pub fn window_length(level: f32, len: usize) -> usize {
    let half = (level.clamp(0.0, 1.0) * MAX_HALF_WIDTH as f32).round() as usize;
    let max_half = len.saturating_sub(1) / 2;
    let half = half.min(max_half);
    if half < 2 {
        1
    } else {
        2 * half + 1
    }
}

/// Convolution weights of a quadratic least-squares fit over `2m + 1` points.
///
/// c_i = 3(3m² + 3m - 1 - 5i²) / ((4m² - 1)(2m + 3)), i = -m..=m
fn quadratic_weights(half: usize) -> Vec<f64> {
    let m = half as f64;
    let norm = (4.0 * m * m - 1.0) * (2.0 * m + 3.0);
    (-(half as i64)..=half as i64)
        .map(|i| {
            let i = i as f64;
            3.0 * (3.0 * m * m + 3.0 * m - 1.0 - 5.0 * i * i) / norm
        })
        .collect()
}

/// Smooth `values` with a quadratic Savitzky-Golay filter of odd length `window`.
///
/// Edges are handled by mirroring the curve about its end samples.
pub fn savitzky_golay(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let half = window / 2;
    if half < 2 || n <= 2 * half {
        return values.to_vec();
    }
    let weights = quadratic_weights(half);
    let last = (n - 1) as i64;
    let reflect = |j: i64| -> usize {
        let j = if j < 0 { -j } else { j };
        let j = if j > last { 2 * last - j } else { j };
        j as usize
    };

    (0..n as i64)
        .map(|center| {
            weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[reflect(center + k as i64 - half as i64)])
                .sum()
        })
        .collect()
}

/// Smooth with the window derived from a 0..1 smoothing level
pub fn smooth_level(values: &[f64], level: f32) -> Vec<f64> {
    savitzky_golay(values, window_length(level, values.len()))
}
