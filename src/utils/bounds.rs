//! Range clamping and precision rounding for generated values
//!
//! Rounding never pushes a value back outside the range it was clamped to:
//! at the lower edge it rounds up, at the upper edge it rounds down.

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics; a `NaN` value comes back as `min`.
pub fn clamp_to_range(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Round to `decimals` places, half away from zero
pub fn round_to_precision(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Round an in-range value to `decimals` places without leaving `[min, max]`.
///
/// When the range is narrower than one rounding step the value is returned
/// unrounded.
pub fn round_within_range(value: f64, min: f64, max: f64, decimals: u32) -> f64 {
    let rounded = round_to_precision(value, decimals);
    if rounded >= min && rounded <= max {
        return rounded;
    }

    let scale = 10_f64.powi(decimals as i32);
    let inward = if rounded < min {
        (value * scale).ceil() / scale
    } else {
        (value * scale).floor() / scale
    };

    if inward >= min && inward <= max {
        inward
    } else {
        value
    }
}
