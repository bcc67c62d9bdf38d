//! Numeric helpers shared by scoring and scaling code.

/// Clamps a score to `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamps a similarity threshold to `[0, 1]`, using `fallback` for NaN.
pub(crate) fn sanitize_similarity(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(0.0, 1.0)
}

/// Scales a pixel length by `factor`, rounding to the nearest pixel (min 1).
pub(crate) fn scaled_len(len: usize, factor: f64) -> usize {
    let scaled = (len as f64 * factor).round();
    if !scaled.is_finite() || scaled < 1.0 {
        1
    } else {
        scaled as usize
    }
}
