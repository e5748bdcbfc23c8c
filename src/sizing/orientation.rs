//! Panel orientation: efficiency by azimuth and compass helpers.

/// Azimuth of true south (degrees).
pub const SOUTH_DEG: f64 = 180.0;

/// Efficiency lost when a panel faces due north instead of due south.
const MAX_ORIENTATION_LOSS: f64 = 0.45;

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Normalizes any finite azimuth into `[0, 360)`.
pub fn normalize_azimuth(azimuth_deg: f64) -> f64 {
    let a = azimuth_deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Angular distance from true south, in `[0, 180]`.
pub fn angular_distance_from_south(azimuth_deg: f64) -> f64 {
    (normalize_azimuth(azimuth_deg) - SOUTH_DEG).abs()
}

/// Orientation efficiency multiplier in `[0.55, 1.0]`.
///
/// Falls off linearly with the angular distance from true south: 1.0 facing
/// south, 0.55 facing north. Any azimuth is accepted and normalized first.
///
/// # Examples
///
/// ```
/// use solar_match::sizing::orientation::compute_orientation_efficiency;
///
/// assert_eq!(compute_orientation_efficiency(180.0), 1.0);
/// assert!((compute_orientation_efficiency(0.0) - 0.55).abs() < 1e-12);
/// ```
pub fn compute_orientation_efficiency(azimuth_deg: f64) -> f64 {
    let distance = angular_distance_from_south(azimuth_deg);
    1.0 - (distance / 180.0) * MAX_ORIENTATION_LOSS
}

/// Eight-point compass direction for an azimuth.
pub fn compass_direction(azimuth_deg: f64) -> &'static str {
    let idx = (normalize_azimuth(azimuth_deg) / 45.0).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[idx]
}

/// Short label for an orientation picker, e.g. `"S (180°) efficiency 100%"`.
pub fn orientation_label(azimuth_deg: f64) -> String {
    let a = normalize_azimuth(azimuth_deg);
    let pct = (compute_orientation_efficiency(a) * 100.0).round();
    format!("{} ({a:.0}°) efficiency {pct:.0}%", compass_direction(a))
}

/// Converts a click offset from the compass centre into a whole-degree azimuth.
///
/// Screen coordinates: `dx` grows to the right, `dy` grows downwards, and
/// north is at the top of the dial.
pub fn azimuth_from_offset(dx: f64, dy: f64) -> f64 {
    let deg = dy.atan2(dx).to_degrees() + 90.0 + 360.0;
    normalize_azimuth(deg.round())
}
