//! Route smoothing
//!
//! Collapses a dense coordinate sequence into the sparse set of points where
//! the path actually bends. Straight runs and gentle drift disappear; corners
//! and u-turns stay, each annotated with the bearing and path distance to the
//! next kept point.

use crate::geo::{bearing, cross_track, distance};
use routesim_core::GeoPoint;
use serde::Serialize;

/// Points closer than this are numerical duplicates
pub const DISTINCT_EPSILON_M: f64 = 0.0001;

/// Accumulated cross-track offset that makes a point significant
pub const SMOOTHING_THRESHOLD_M: f64 = 1.5;

/// A retained coordinate with its derived motion attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignificantPoint {
    /// Index into the source coordinates, None for synthetic points
    pub index: Option<usize>,
    pub point: GeoPoint,
    /// Bearing towards the next significant point
    pub bearing: f64,
    /// Path length to the next significant point
    pub distance_to_next: f64,
    pub speed_mps: f64,
}

impl SignificantPoint {
    pub fn new(index: Option<usize>, point: GeoPoint) -> Self {
        Self {
            index,
            point,
            bearing: 0.0,
            distance_to_next: 0.0,
            speed_mps: 0.0,
        }
    }
}

/// Drop consecutive points that are numerically the same place
///
/// Only neighbors are compared, so returning along the same road (a u-turn)
/// keeps every point.
pub fn distinct_points(points: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut distinct: Vec<GeoPoint> = Vec::with_capacity(points.len());
    for &point in points {
        match distinct.last() {
            Some(&last) if distance(last, point) <= DISTINCT_EPSILON_M => {}
            _ => distinct.push(point),
        }
    }
    distinct
}

/// Reduce distinct points to significant points with the default threshold
pub fn smooth_route(points: &[GeoPoint]) -> Vec<SignificantPoint> {
    smooth_route_with_threshold(points, SMOOTHING_THRESHOLD_M)
}

pub fn smooth_route_with_threshold(points: &[GeoPoint], threshold_m: f64) -> Vec<SignificantPoint> {
    let keep = significant_indices(points, threshold_m);
    annotate(points, &keep)
}

fn significant_indices(points: &[GeoPoint], threshold_m: f64) -> Vec<usize> {
    let n = points.len();
    if n <= 3 {
        return (0..n).collect();
    }

    let mut keep = vec![0];
    let mut accumulated = 0.0;
    for i in 1..n - 1 {
        let xt = cross_track(points[i - 1], points[i], points[i + 1]);
        if xt.reversed {
            keep.push(i);
            accumulated = 0.0;
            continue;
        }

        accumulated += xt.distance.abs();
        if accumulated > threshold_m {
            keep.push(i);
            accumulated = 0.0;
        }
    }
    keep.push(n - 1);
    keep
}

fn annotate(points: &[GeoPoint], keep: &[usize]) -> Vec<SignificantPoint> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(total);
    for w in points.windows(2) {
        total += distance(w[0], w[1]);
        cumulative.push(total);
    }

    let mut significant: Vec<SignificantPoint> = keep
        .iter()
        .map(|&i| SignificantPoint::new(Some(i), points[i]))
        .collect();

    for k in 0..significant.len().saturating_sub(1) {
        let (from, to) = (keep[k], keep[k + 1]);
        significant[k].bearing = bearing(points[from], points[to]);
        significant[k].distance_to_next = cumulative[to] - cumulative[from];
    }
    if significant.len() >= 2 {
        let last = significant.len() - 1;
        significant[last].bearing = significant[last - 1].bearing;
    }

    significant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    fn straight(count: usize, spacing: f64, heading: f64) -> Vec<GeoPoint> {
        let mut points = vec![GeoPoint::new(13.4, 52.5)];
        for _ in 1..count {
            let last = *points.last().unwrap();
            points.push(destination(last, spacing, heading));
        }
        points
    }

    #[test]
    fn test_distinct_points_removes_duplicates() {
        let a = GeoPoint::new(1.0, 1.0);
        let b = GeoPoint::new(1.001, 1.0);
        let points = distinct_points(&[a, a, b, b, b, a]);
        assert_eq!(points, vec![a, b, a]);
    }

    #[test]
    fn test_distinct_points_empty() {
        assert!(distinct_points(&[]).is_empty());
    }

    #[test]
    fn test_three_points_are_all_kept() {
        let points = straight(3, 10.0, 0.0);
        let significant = smooth_route(&points);
        assert_eq!(significant.len(), 3);
        assert_eq!(significant[1].index, Some(1));
    }

    #[test]
    fn test_straight_road_collapses_to_endpoints() {
        let points = straight(50, 10.0, 45.0);
        let significant = smooth_route(&points);
        assert_eq!(significant.len(), 2);
        assert_eq!(significant[0].index, Some(0));
        assert_eq!(significant[1].index, Some(49));
        assert!((significant[0].distance_to_next - 490.0).abs() < 1e-3);
        assert!((significant[0].bearing - 45.0).abs() < 0.1);
        assert_eq!(significant[1].distance_to_next, 0.0);
        assert_eq!(significant[1].bearing, significant[0].bearing);
    }

    #[test]
    fn test_corner_is_kept() {
        let mut points = straight(10, 20.0, 0.0);
        let corner = *points.last().unwrap();
        for i in 1..10 {
            points.push(destination(corner, 20.0 * i as f64, 90.0));
        }
        let significant = smooth_route(&points);
        assert_eq!(significant.len(), 3);
        assert_eq!(significant[1].index, Some(9));
        assert!((significant[0].bearing - 0.0).abs() < 0.1);
        assert!((significant[1].bearing - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_u_turn_is_never_smoothed_away() {
        let mut points = straight(6, 20.0, 0.0);
        let turn = *points.last().unwrap();
        for i in 1..6 {
            points.push(destination(turn, 20.0 * i as f64 - 5.0, 180.0));
        }
        let significant = smooth_route_with_threshold(&points, 1_000.0);
        assert!(significant.iter().any(|p| p.index == Some(5)));
    }

    #[test]
    fn test_distance_to_next_follows_the_path() {
        let mut points = straight(10, 20.0, 0.0);
        let corner = *points.last().unwrap();
        for i in 1..10 {
            points.push(destination(corner, 20.0 * i as f64, 90.0));
        }
        let significant = smooth_route(&points);
        let total: f64 = significant.iter().map(|p| p.distance_to_next).sum();
        assert!((total - 360.0).abs() < 1e-3, "got {}", total);
    }

    #[test]
    fn test_single_point() {
        let significant = smooth_route(&[GeoPoint::new(0.0, 0.0)]);
        assert_eq!(significant.len(), 1);
        assert_eq!(significant[0].distance_to_next, 0.0);
    }
}
