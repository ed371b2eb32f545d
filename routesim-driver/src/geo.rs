//! Spherical geometry helpers
//!
//! Great-circle distance, initial bearing and destination work on
//! longitude/latitude degrees through `geo`'s haversine measure. Curvature
//! detection projects points into an earth-centered cartesian frame and
//! works with fixed-size vectors.

use ::geo::{Bearing, Destination, Distance, Haversine, Point};
use nalgebra::Vector3;
use routesim_core::units::{normalize_degrees, EARTH_RADIUS_M};
use routesim_core::GeoPoint;

fn to_point(point: GeoPoint) -> Point<f64> {
    Point::new(point.lon, point.lat)
}

/// Great-circle (haversine) distance in meters
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine::distance(to_point(a), to_point(b))
}

/// Initial bearing from `a` towards `b`, degrees in [0, 360)
pub fn bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    normalize_degrees(Haversine::bearing(to_point(a), to_point(b)))
}

/// Point reached by traveling `meters` from `origin` along `bearing_deg`
pub fn destination(origin: GeoPoint, meters: f64, bearing_deg: f64) -> GeoPoint {
    let reached = Haversine::destination(to_point(origin), bearing_deg, meters);
    GeoPoint::new(reached.x(), reached.y())
}

/// Total length of a path in meters
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Earth-centered cartesian position in meters
pub fn to_cartesian(point: GeoPoint) -> Vector3<f64> {
    let lat = point.lat.to_radians();
    let lon = point.lon.to_radians();
    Vector3::new(
        EARTH_RADIUS_M * lat.cos() * lon.cos(),
        EARTH_RADIUS_M * lat.cos() * lon.sin(),
        EARTH_RADIUS_M * lat.sin(),
    )
}

/// Offset of a point from the chord joining its neighbors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossTrack {
    /// Signed perpendicular distance in meters (positive = right of the chord)
    pub distance: f64,

    /// The path doubles back on itself at this point
    pub reversed: bool,
}

/// Cross-track distance of `current` from the chord `previous -> next`
pub fn cross_track(previous: GeoPoint, current: GeoPoint, next: GeoPoint) -> CrossTrack {
    let p = to_cartesian(previous);
    let c = to_cartesian(current);
    let n = to_cartesian(next);

    let incoming = c - p;
    let outgoing = n - c;
    let chord = n - p;
    let chord_len = chord.norm();

    // previous == next: a pure out-and-back
    if chord_len < 1e-6 {
        return CrossTrack {
            distance: incoming.norm(),
            reversed: true,
        };
    }

    let along = chord / chord_len;
    let up = c.normalize();
    let right = along.cross(&up);

    CrossTrack {
        distance: incoming.dot(&right),
        reversed: incoming.dot(&along) < 0.0 || outgoing.dot(&along) < 0.0,
    }
}

/// Walks a path by increasing distance, resolving positions along it
pub struct PathCursor<'a> {
    points: &'a [GeoPoint],
    index: usize,
    walked: f64,
}

impl<'a> PathCursor<'a> {
    pub fn new(points: &'a [GeoPoint]) -> Self {
        Self {
            points,
            index: 0,
            walked: 0.0,
        }
    }

    /// Position `meters` from the start of the path
    ///
    /// Queries are expected in non-decreasing order; distances past the end
    /// resolve to the last point.
    pub fn point_at(&mut self, meters: f64) -> Option<GeoPoint> {
        let first = *self.points.first()?;
        if self.points.len() == 1 || meters <= 0.0 {
            return Some(first);
        }

        while self.index + 1 < self.points.len() {
            let from = self.points[self.index];
            let to = self.points[self.index + 1];
            let leg = distance(from, to);
            let remaining = meters - self.walked;
            if remaining <= leg {
                if remaining <= 0.0 || leg <= 0.0 {
                    return Some(from);
                }
                return Some(destination(from, remaining, bearing(from, to)));
            }
            self.walked += leg;
            self.index += 1;
        }

        self.points.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat)
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance(pt(0.0, 0.0), pt(0.0, 1.0));
        assert!((d - 111_195.08).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        assert_eq!(distance(pt(13.4, 52.5), pt(13.4, 52.5)), 0.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = pt(0.0, 0.0);
        assert!((bearing(origin, pt(0.0, 1.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(origin, pt(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, pt(0.0, -1.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(origin, pt(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_round_trips_distance_and_bearing() {
        let origin = pt(-77.03, 38.89);
        let target = destination(origin, 1234.5, 42.0);
        assert!((distance(origin, target) - 1234.5).abs() < 1e-6);
        assert!((bearing(origin, target) - 42.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_track_of_straight_line_is_zero() {
        let a = pt(0.0, 0.0);
        let b = destination(a, 100.0, 0.0);
        let c = destination(b, 100.0, 0.0);
        let xt = cross_track(a, b, c);
        assert!(xt.distance.abs() < 1e-3, "got {}", xt.distance);
        assert!(!xt.reversed);
    }

    #[test]
    fn test_cross_track_of_right_angle() {
        let a = pt(0.0, 0.0);
        let b = destination(a, 100.0, 0.0);
        let c = destination(b, 100.0, 90.0);
        let xt = cross_track(a, b, c);
        // Corner of a right isosceles triangle sits hypot/2 from the chord
        assert!((xt.distance.abs() - 70.71).abs() < 0.1, "got {}", xt.distance);
        assert!(!xt.reversed);
    }

    #[test]
    fn test_cross_track_detects_u_turn() {
        let a = pt(0.0, 0.0);
        let b = destination(a, 100.0, 0.0);
        let c = destination(b, 60.0, 180.0);
        assert!(cross_track(a, b, c).reversed);

        let back_to_start = cross_track(a, b, a);
        assert!(back_to_start.reversed);
    }

    #[test]
    fn test_path_cursor_walks_corners() {
        let a = pt(0.0, 0.0);
        let b = destination(a, 100.0, 0.0);
        let c = destination(b, 100.0, 90.0);
        let path = [a, b, c];
        let mut cursor = PathCursor::new(&path);

        assert_eq!(cursor.point_at(0.0), Some(a));
        let mid = cursor.point_at(50.0).unwrap();
        assert!((distance(a, mid) - 50.0).abs() < 1e-6);
        let past_corner = cursor.point_at(150.0).unwrap();
        assert!((distance(b, past_corner) - 50.0).abs() < 1e-6);
        let end = cursor.point_at(1_000.0).unwrap();
        assert_eq!(end, c);
    }

    #[test]
    fn test_path_cursor_empty_path() {
        let mut cursor = PathCursor::new(&[]);
        assert!(cursor.point_at(1.0).is_none());
    }
}
