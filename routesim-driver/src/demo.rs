//! Demo route for trying the simulator without a route provider
//!
//! Lays out a small circuit of straights and corners, then packages it the
//! way a provider delivers a leg: one encoded polyline per step and a
//! distance/speed annotation for every stretch between consecutive points.

use crate::geo::{destination, distance};
use crate::polyline::encode;
use routesim_core::units::{kph_to_mps, normalize_degrees};
use routesim_core::{GeoPoint, RouteLeg, RouteProgress};

/// Precision the demo geometry is encoded with
pub const DEMO_PRECISION: u32 = 6;

pub const DEMO_ROUTE_ID: &str = "demo-circuit";

/// Spacing of generated points along a section
const POINT_SPACING_M: f64 = 25.0;

// =============================================================================
// Circuit definition, one step per section
// =============================================================================

#[derive(Clone, Copy)]
struct TrackSection {
    length_m: f64,
    heading_change_deg: f64, // spread over the section, + = right
    speed_kph: f64,
}

fn demo_track() -> Vec<TrackSection> {
    vec![
        // Start straight
        TrackSection { length_m: 600.0, heading_change_deg: 0.0,    speed_kph: 70.0 },
        // Right-hander
        TrackSection { length_m: 100.0, heading_change_deg: 90.0,   speed_kph: 25.0 },
        TrackSection { length_m: 400.0, heading_change_deg: 0.0,    speed_kph: 60.0 },
        // Sweeping left
        TrackSection { length_m: 250.0, heading_change_deg: -45.0,  speed_kph: 45.0 },
        TrackSection { length_m: 300.0, heading_change_deg: 0.0,    speed_kph: 55.0 },
        // Hairpin
        TrackSection { length_m: 75.0,  heading_change_deg: 160.0,  speed_kph: 15.0 },
        // Run home
        TrackSection { length_m: 500.0, heading_change_deg: 0.0,    speed_kph: 65.0 },
    ]
}

fn demo_origin() -> GeoPoint {
    GeoPoint::new(13.4010, 52.4732)
}

/// Points of every section; each section starts where the previous ended
pub fn demo_step_points() -> Vec<Vec<GeoPoint>> {
    let mut position = demo_origin();
    let mut heading = 0.0;
    let mut steps = Vec::new();

    for section in demo_track() {
        let count = (section.length_m / POINT_SPACING_M).ceil().max(1.0) as usize;
        let spacing = section.length_m / count as f64;
        let turn = section.heading_change_deg / count as f64;

        let mut points = vec![position];
        for _ in 0..count {
            heading = normalize_degrees(heading + turn);
            position = destination(position, spacing, heading);
            points.push(position);
        }
        steps.push(points);
    }
    steps
}

/// The circuit as a provider leg with traffic annotation
pub fn demo_leg() -> RouteLeg {
    let steps = demo_step_points();
    let mut distances = Vec::new();
    let mut speeds = Vec::new();

    for (points, section) in steps.iter().zip(demo_track()) {
        for w in points.windows(2) {
            distances.push(distance(w[0], w[1]));
            speeds.push(kph_to_mps(section.speed_kph));
        }
    }

    RouteLeg::from_geometries(steps.iter().map(|points| encode(points, DEMO_PRECISION)))
        .with_annotation(distances, speeds)
}

/// Progress on the demo leg after `distance_traveled` meters
pub fn demo_progress(distance_traveled: f64) -> RouteProgress {
    RouteProgress {
        route_id: DEMO_ROUTE_ID.to_string(),
        leg_index: 0,
        distance_traveled,
        leg: demo_leg(),
    }
}
