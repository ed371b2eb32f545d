//! Unit conversions and compact serialization helpers
//!
//! Simulation math runs on plain `f64` in SI units (meters, seconds, m/s).
//! The helpers here normalize angles, convert clock units, and round values
//! when frames are serialized to keep NDJSON payloads small.

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Round f64 to 4 decimal places for compact JSON serialization
pub(crate) fn round4<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 10_000.0).round() / 10_000.0)
}

/// Round coordinates to 7 decimal places (~1cm), finer than polyline6
pub(crate) fn round7<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 10_000_000.0).round() / 10_000_000.0)
}

/// Normalize an angle in degrees to [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

/// Smallest angle between two headings, in [0, 180]
pub fn heading_delta(from: f64, to: f64) -> f64 {
    let d = normalize_degrees(to - from);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Kilometers per hour to meters per second
pub fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

/// Length of one sample period in milliseconds
pub fn sample_period_ms(frequency_hz: f64) -> f64 {
    1000.0 / frequency_hz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_heading_delta_wraps_around_north() {
        assert!((heading_delta(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((heading_delta(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((heading_delta(0.0, 180.0) - 180.0).abs() < 1e-9);
        assert!((heading_delta(90.0, 180.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_kph_to_mps() {
        assert!((kph_to_mps(36.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_period_ms() {
        assert_eq!(sample_period_ms(1.0), 1000.0);
        assert_eq!(sample_period_ms(10.0), 100.0);
    }
}
