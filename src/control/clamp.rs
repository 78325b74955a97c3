/// Bounds `value` into the closed interval `[min, max]`.
///
/// Unlike `f64::clamp` this never panics on a misordered or NaN range,
/// which matters when the bounds come straight from user configuration.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
