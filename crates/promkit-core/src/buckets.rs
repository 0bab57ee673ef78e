//! Histogram bucket helpers.

/// Bounds used when a histogram is created without explicit buckets:
/// `0.5, 1.0, ... 10.0`.
pub fn default_buckets() -> Vec<f64> {
    generate_linear_buckets(0.5, 0.5, 20)
}

/// `count` bounds starting at `start`, each `width` apart.
///
/// Every bound is rounded to the larger decimal-place count of `start` and
/// `width`, so `generate_linear_buckets(0.1, 0.2, 3)` yields `[0.1, 0.3, 0.5]`
/// rather than accumulated float noise.
pub fn generate_linear_buckets(start: f64, width: f64, count: usize) -> Vec<f64> {
    let places = decimal_places(start).max(decimal_places(width));
    (0..count)
        .map(|i| round_float(start + width * i as f64, places))
        .collect()
}

/// Round `value` to `decimal_places` digits after the point, half away from zero.
///
/// `round_float(1.599633154856, 2) == 1.6`
///
/// Values that cannot be scaled by `10^decimal_places` without overflowing
/// (tiny or subnormal inputs ask for hundreds of places) come back unchanged.
pub fn round_float(value: f64, decimal_places: u32) -> f64 {
    let pow = 10f64.powi(i32::try_from(decimal_places).unwrap_or(i32::MAX));
    let scaled = value * pow;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / pow
}

/// Number of significant digits after the decimal point in the shortest
/// representation of `n`.
pub fn decimal_places(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let s = n.to_string();
    match s.split_once('.') {
        Some((_, frac)) => frac.trim_end_matches('0').len() as u32,
        None => 0,
    }
}
