//! Curvature-based speed profile
//!
//! Every significant point gets a target speed from how sharply the route
//! turns there, then a repair pass lowers speeds until every transition can
//! be driven within the configured acceleration and braking limits.

use routesim_core::units::heading_delta;
use routesim_core::SimulationOptions;

use crate::smoother::SignificantPoint;

// =============================================================================
// Turn speed policy, evaluated top to bottom: first matching band wins
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum SpeedRule {
    MaxSpeed,
    UTurnSpeed,
    TurnCurve,
}

#[derive(Debug, Clone, Copy)]
struct TurnBand {
    min_deg: f64,
    max_deg: f64,
    rule: SpeedRule,
}

const TURN_BANDS: [TurnBand; 3] = [
    TurnBand { min_deg: 0.0,   max_deg: 20.0,  rule: SpeedRule::MaxSpeed },
    TurnBand { min_deg: 150.0, max_deg: 180.0, rule: SpeedRule::UTurnSpeed },
    TurnBand { min_deg: 20.0,  max_deg: 150.0, rule: SpeedRule::TurnCurve },
];

/// Target speed through a turn of `delta_deg` degrees (0 = straight on)
pub fn turn_speed(options: &SimulationOptions, delta_deg: f64) -> f64 {
    let delta = delta_deg.abs().min(180.0);
    let rule = TURN_BANDS
        .iter()
        .find(|band| delta >= band.min_deg && delta <= band.max_deg)
        .map(|band| band.rule)
        .unwrap_or(SpeedRule::TurnCurve);

    match rule {
        SpeedRule::MaxSpeed => options.max_speed_mps,
        SpeedRule::UTurnSpeed => options.u_turn_speed_mps,
        SpeedRule::TurnCurve => {
            let straightness = 1.0 - (delta / 90.0).min(1.0);
            options.turn_speed_mps
                + straightness * straightness * (options.max_speed_mps - options.turn_speed_mps)
        }
    }
}

/// Assign curvature speeds, then repair them for feasibility
pub fn build_speed_profile(points: &mut [SignificantPoint], options: &SimulationOptions) {
    assign_turn_speeds(points, options);
    let corrections = repair_feasibility(points, options);
    tracing::debug!(points = points.len(), corrections, "built speed profile");
}

/// Stationary endpoints, turn-dependent speeds in between
pub fn assign_turn_speeds(points: &mut [SignificantPoint], options: &SimulationOptions) {
    let n = points.len();
    for i in 0..n {
        points[i].speed_mps = if i == 0 || i == n - 1 {
            0.0
        } else {
            turn_speed(options, heading_delta(points[i - 1].bearing, points[i].bearing))
        };
    }
}

/// Slack on runway comparisons, absorbs rounding in the feasible-speed solve
const RUNWAY_EPSILON_M: f64 = 1e-9;

/// Lower speeds until every transition fits the acceleration bounds
///
/// Uses a re-scan index rather than recursion: a lowered start speed can
/// make the previous transition infeasible, so the scan steps back one
/// segment. A correction is only made when it strictly lowers a speed, which
/// bounds the loop.
///
/// Returns the number of corrections made.
pub fn repair_feasibility(points: &mut [SignificantPoint], options: &SimulationOptions) -> usize {
    let mut corrections = 0;
    let mut i = 0;

    while i + 1 < points.len() {
        let from = points[i].speed_mps;
        let to = points[i + 1].speed_mps;
        let runway = points[i].distance_to_next;

        if to < from {
            let required = required_distance(from, to, options.min_acceleration);
            let lowered = reachable_speed(to, -options.min_acceleration, runway);
            if runway < required - RUNWAY_EPSILON_M && lowered < from {
                points[i].speed_mps = lowered;
                corrections += 1;
                if i > 0 {
                    i -= 1;
                    continue;
                }
            }
        } else if to > from {
            let required = required_distance(from, to, options.max_acceleration);
            let lowered = reachable_speed(from, options.max_acceleration, runway);
            if runway < required - RUNWAY_EPSILON_M && lowered < to {
                points[i + 1].speed_mps = lowered;
                corrections += 1;
            }
        }
        i += 1;
    }

    corrections
}

/// Distance needed to go from `from` to `to` m/s at constant `acceleration`
pub fn required_distance(from: f64, to: f64, acceleration: f64) -> f64 {
    (to * to - from * from) / (2.0 * acceleration)
}

/// Speed reached from `speed` after `distance` at `acceleration` magnitude
fn reachable_speed(speed: f64, acceleration: f64, distance: f64) -> f64 {
    (speed * speed + 2.0 * acceleration * distance).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use routesim_core::GeoPoint;

    fn options() -> SimulationOptions {
        SimulationOptions::builder()
            .max_speed_mps(30.0)
            .turn_speed_mps(3.0)
            .u_turn_speed_mps(1.0)
            .max_acceleration(3.0)
            .min_acceleration(-4.0)
            .build()
            .unwrap()
    }

    fn profile(bearings: &[f64], distances: &[f64]) -> Vec<SignificantPoint> {
        bearings
            .iter()
            .zip(distances)
            .enumerate()
            .map(|(i, (&bearing, &distance))| SignificantPoint {
                index: Some(i),
                point: GeoPoint::new(0.0, 0.0),
                bearing,
                distance_to_next: distance,
                speed_mps: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_turn_speed_bands() {
        let o = options();
        assert_eq!(turn_speed(&o, 0.0), 30.0);
        assert_eq!(turn_speed(&o, 20.0), 30.0);
        assert_eq!(turn_speed(&o, 90.0), 3.0);
        assert_eq!(turn_speed(&o, 120.0), 3.0);
        assert_eq!(turn_speed(&o, 150.0), 1.0);
        assert_eq!(turn_speed(&o, 180.0), 1.0);
    }

    #[test]
    fn test_turn_speed_curve_is_monotonic() {
        let o = options();
        let mut last = f64::INFINITY;
        for delta in (21..=90).map(f64::from) {
            let speed = turn_speed(&o, delta);
            assert!(speed <= last);
            assert!(speed >= o.turn_speed_mps && speed < o.max_speed_mps);
            last = speed;
        }
        let at_45 = turn_speed(&o, 45.0);
        assert!((at_45 - (3.0 + 0.25 * 27.0)).abs() < 1e-9);
    }

    #[test]
    fn test_endpoints_are_stationary() {
        let mut points = profile(&[0.0, 0.0, 0.0], &[1_000.0, 1_000.0, 0.0]);
        build_speed_profile(&mut points, &options());
        assert_eq!(points[0].speed_mps, 0.0);
        assert_eq!(points[2].speed_mps, 0.0);
        assert_eq!(points[1].speed_mps, 30.0);
    }

    #[test]
    fn test_short_runway_limits_acceleration() {
        let mut points = profile(&[0.0, 0.0, 0.0], &[6.0, 1_000.0, 0.0]);
        build_speed_profile(&mut points, &options());
        // sqrt(2 * 3 * 6)
        assert!((points[1].speed_mps - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_braking_cascades_backwards() {
        // Fast straights into a tight sequence of short segments ending stopped
        let bearings = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let distances = [500.0, 500.0, 2.0, 2.0, 2.0, 0.0];
        let mut points = profile(&bearings, &distances);
        let o = options();
        let corrections = build_speed_profile_counted(&mut points, &o);
        assert!(corrections > 0);
        assert_feasible(&points, &o);
        // 6m of braking at 4 m/s² leaves sqrt(48) at the start of the run-in
        assert!((points[2].speed_mps - 48f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zig_zag_is_feasible() {
        let bearings: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 0.0 } else { 60.0 }).collect();
        let distances: Vec<f64> = (0..40).map(|i| 5.0 + (i % 7) as f64 * 13.0).collect();
        let mut points = profile(&bearings, &distances);
        let o = options();
        build_speed_profile(&mut points, &o);
        assert_feasible(&points, &o);
    }

    #[test]
    fn test_repair_terminates_on_irregular_profiles() {
        let o = options();
        let mut seed = 0x2545_f491_4f6c_dd1du64;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 11) as f64 / (1u64 << 53) as f64
        };

        for _ in 0..500 {
            let n = 2 + (next() * 60.0) as usize;
            let bearings: Vec<f64> = (0..n).map(|_| next() * 360.0).collect();
            let distances: Vec<f64> = (0..n).map(|_| 0.5 + next() * 80.0).collect();
            let mut points = profile(&bearings, &distances);
            build_speed_profile(&mut points, &o);
            assert_feasible(&points, &o);
        }
    }

    #[test]
    fn test_already_feasible_pair_is_not_corrected() {
        let o = options();
        // 8 m of braking from sqrt(64) to 0 is exactly the runway
        let mut points = profile(&[0.0, 0.0], &[8.0, 0.0]);
        points[0].speed_mps = 8.0;
        assert_eq!(repair_feasibility(&mut points, &o), 0);
        assert_eq!(points[0].speed_mps, 8.0);
    }

    fn build_speed_profile_counted(points: &mut [SignificantPoint], options: &SimulationOptions) -> usize {
        assign_turn_speeds(points, options);
        repair_feasibility(points, options)
    }

    fn assert_feasible(points: &[SignificantPoint], options: &SimulationOptions) {
        for w in points.windows(2) {
            let (from, to) = (w[0].speed_mps, w[1].speed_mps);
            let needed = (to * to - from * from).abs() / (2.0 * w[0].distance_to_next);
            let limit = if to < from {
                -options.min_acceleration
            } else {
                options.max_acceleration
            };
            assert!(needed <= limit * (1.0 + 1e-6), "{} -> {} over {}", from, to, w[0].distance_to_next);
        }
    }
}
