//! Traffic-annotated speed boundaries
//!
//! The route provider annotates a leg with the distance and expected speed
//! of consecutive stretches. Those stretches are matched onto the decoded
//! points by walking cumulative distance, giving segment boundaries that
//! replace the curvature-derived speed profile.

use crate::geo::distance;
use routesim_core::GeoPoint;
use serde::Serialize;

/// How close a cumulative distance must be to count as a match
pub const MATCH_TOLERANCE_M: f64 = 0.5;

/// Lowest cruise cap for a stretch, so a zero annotation cannot stall the drive
pub const MIN_SEGMENT_SPEED_MPS: f64 = 0.5;

/// A point where one annotated stretch ends and the next begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficBoundary {
    /// Index into the distinct points
    pub index: usize,
    pub point: GeoPoint,
    /// Speed when passing the boundary
    pub speed_mps: f64,
    /// Cruise cap of the stretch starting here
    pub segment_speed_mps: f64,
    /// Path length to the next boundary
    pub distance_to_next: f64,
}

/// Match annotation stretches onto `points`
///
/// The first boundary is the first point at rest and the last one is always
/// the last point at rest. An annotation that runs past the end of the
/// geometry matches the closest point rather than failing; stretches left
/// over once the points run out are dropped. `default_speed_mps` caps the
/// stretches without an annotated speed.
pub fn traffic_boundaries(
    points: &[GeoPoint],
    distances: &[f64],
    speeds: &[f64],
    default_speed_mps: f64,
) -> Vec<TrafficBoundary> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mut cumulative = Vec::with_capacity(n);
    let mut total = 0.0;
    cumulative.push(total);
    for w in points.windows(2) {
        total += distance(w[0], w[1]);
        cumulative.push(total);
    }

    // (point index, annotated speed of the stretch ending there)
    let mut ends: Vec<(usize, Option<f64>)> = vec![(0, None)];
    let mut cursor = 0;
    for (k, (&target, &speed)) in distances.iter().zip(speeds).enumerate() {
        if cursor + 1 >= n {
            tracing::debug!(dropped = distances.len() - k, "geometry exhausted before annotation");
            break;
        }
        if target <= MATCH_TOLERANCE_M {
            continue;
        }

        let end = match_stretch(&cumulative, cursor, target);
        let walked = cumulative[end] - cumulative[cursor];
        if (walked - target).abs() > MATCH_TOLERANCE_M {
            tracing::warn!(
                annotation = k,
                target,
                matched = walked,
                "annotation distance does not line up with geometry, using closest point"
            );
        }
        ends.push((end, Some(speed)));
        cursor = end;
    }

    if cursor != n - 1 {
        ends.push((n - 1, None));
    }

    let mut boundaries: Vec<TrafficBoundary> = ends
        .iter()
        .map(|&(index, speed)| TrafficBoundary {
            index,
            point: points[index],
            speed_mps: speed.unwrap_or(0.0),
            segment_speed_mps: default_speed_mps,
            distance_to_next: 0.0,
        })
        .collect();

    let last = boundaries.len() - 1;
    boundaries[0].speed_mps = 0.0;
    boundaries[last].speed_mps = 0.0;

    let mut previous_speed = None;
    for j in 0..last {
        let annotated = ends[j + 1].1.or(previous_speed);
        previous_speed = annotated;
        boundaries[j].segment_speed_mps = annotated
            .map(|speed| speed.max(MIN_SEGMENT_SPEED_MPS))
            .unwrap_or(default_speed_mps);
        boundaries[j].distance_to_next = cumulative[boundaries[j + 1].index] - cumulative[boundaries[j].index];
    }

    boundaries
}

/// Index after `start` whose cumulative distance from `start` best matches `target`
fn match_stretch(cumulative: &[f64], start: usize, target: f64) -> usize {
    let origin = cumulative[start];
    for j in start + 1..cumulative.len() {
        let walked = cumulative[j] - origin;
        if walked >= target - MATCH_TOLERANCE_M {
            let before = target - (cumulative[j - 1] - origin);
            let after = walked - target;
            return if j - 1 > start && before < after { j - 1 } else { j };
        }
    }
    cumulative.len() - 1
}
