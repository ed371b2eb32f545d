//! Drive orchestration
//!
//! A [`Driver`] owns the simulated clock of one vehicle. Each `drive_*` call
//! turns a path into frames stamped on that clock and advances it, so
//! successive calls form one continuous timeline until [`Driver::reset`].

use routesim_core::units::sample_period_ms;
use routesim_core::{GeoPoint, RouteLeg, SimError, SimResult, SimulationFrame, SimulationOptions};

use crate::bearing::synthesize_bearings;
use crate::geo::{bearing, distance, PathCursor};
use crate::interpolator::{Feasibility, SegmentPlan};
use crate::polyline::LegGeometryStream;
use crate::smoother::{distinct_points, smooth_route};
use crate::speed_profile::build_speed_profile;
use crate::traffic::traffic_boundaries;

/// One planned segment and the geometry it covers
struct PlannedSegment<'a> {
    path: &'a [GeoPoint],
    bearing: f64,
    plan: SegmentPlan,
}

/// Simulated vehicle clock, Idle until the first drive
#[derive(Debug, Clone, Default)]
pub struct Driver {
    clock_ms: f64,
    driving: bool,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time the next frame will be stamped with
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn is_driving(&self) -> bool {
        self.driving
    }

    /// Back to Idle with the clock at zero
    pub fn reset(&mut self) {
        self.clock_ms = 0.0;
        self.driving = false;
    }

    /// Drive an ordered coordinate list with curvature-derived speeds
    ///
    /// No distinct point yields no frames. A single distinct point yields one
    /// stationary frame. Nothing on the clock changes when an error is
    /// returned.
    pub fn drive_coordinates(
        &mut self,
        options: &SimulationOptions,
        points: &[GeoPoint],
    ) -> SimResult<Vec<SimulationFrame>> {
        options.validate()?;
        let distinct = distinct_points(points);
        if distinct.len() < 2 {
            return Ok(self.stationary(options, distinct.first().copied()));
        }

        let mut significant = smooth_route(&distinct);
        build_speed_profile(&mut significant, options);

        let mut segments = Vec::with_capacity(significant.len().saturating_sub(1));
        for w in significant.windows(2) {
            let (Some(from), Some(to)) = (w[0].index, w[1].index) else {
                return Err(SimError::contract("significant point without a source index"));
            };
            let plan = SegmentPlan::solve(
                options,
                w[0].speed_mps,
                w[1].speed_mps,
                w[0].distance_to_next,
                Feasibility::Strict,
            )?;
            segments.push(PlannedSegment {
                path: &distinct[from..=to],
                bearing: w[0].bearing,
                plan,
            });
        }

        let frames = self.emit(options, &segments);
        tracing::debug!(
            points = points.len(),
            significant = significant.len(),
            frames = frames.len(),
            clock_ms = self.clock_ms,
            "drove coordinates"
        );
        Ok(frames)
    }

    /// Drive a leg with speeds taken from its traffic annotation
    ///
    /// Fails with a contract violation if the leg lacks equal-length
    /// distance and speed arrays.
    pub fn drive_leg_with_traffic(
        &mut self,
        options: &SimulationOptions,
        leg: &RouteLeg,
        precision: u32,
    ) -> SimResult<Vec<SimulationFrame>> {
        options.validate()?;
        let (distances, speeds) = leg.traffic_annotation()?;
        let points = LegGeometryStream::new(leg, precision).decode_all()?;
        self.drive_points_with_traffic(options, &points, distances, speeds)
    }

    /// Drive decoded points with per-stretch annotation data
    pub fn drive_points_with_traffic(
        &mut self,
        options: &SimulationOptions,
        points: &[GeoPoint],
        distances: &[f64],
        speeds: &[f64],
    ) -> SimResult<Vec<SimulationFrame>> {
        options.validate()?;
        if let Some(bad) = distances.iter().chain(speeds).find(|v| !v.is_finite() || **v < 0.0) {
            return Err(SimError::contract(format!(
                "traffic annotation values must be finite and non-negative, got {}",
                bad
            )));
        }
        let distinct = distinct_points(points);
        if distinct.len() < 2 {
            return Ok(self.stationary(options, distinct.first().copied()));
        }

        let boundaries = traffic_boundaries(&distinct, distances, speeds, options.max_speed_mps);
        let mut segments = Vec::with_capacity(boundaries.len().saturating_sub(1));
        for w in boundaries.windows(2) {
            let segment_options = options.with_max_speed(w[0].segment_speed_mps);
            let plan = SegmentPlan::solve(
                &segment_options,
                w[0].speed_mps,
                w[1].speed_mps,
                w[0].distance_to_next,
                Feasibility::Authoritative,
            )?;
            segments.push(PlannedSegment {
                path: &distinct[w[0].index..=w[1].index],
                bearing: bearing(w[0].point, w[1].point),
                plan,
            });
        }

        let frames = self.emit(options, &segments);
        tracing::debug!(
            points = points.len(),
            boundaries = boundaries.len(),
            frames = frames.len(),
            clock_ms = self.clock_ms,
            "drove leg with traffic"
        );
        Ok(frames)
    }

    fn stationary(&mut self, options: &SimulationOptions, point: Option<GeoPoint>) -> Vec<SimulationFrame> {
        let Some(point) = point else {
            return Vec::new();
        };
        let frame = SimulationFrame {
            point,
            time_ms: self.clock_ms,
            speed_mps: 0.0,
            bearing: 0.0,
            distance_to_next: 0.0,
        };
        self.clock_ms += sample_period_ms(options.frequency);
        self.driving = true;
        vec![frame]
    }

    /// Stamp every segment's samples on the clock, sharing junction samples
    fn emit(&mut self, options: &SimulationOptions, segments: &[PlannedSegment<'_>]) -> Vec<SimulationFrame> {
        let mut frames = Vec::new();
        let last = segments.len().saturating_sub(1);

        for (k, segment) in segments.iter().enumerate() {
            let samples = segment.plan.samples(options.frequency);
            let keep = if k == last {
                samples.len()
            } else {
                samples.len().saturating_sub(1)
            };

            let mut cursor = PathCursor::new(segment.path);
            for sample in &samples[..keep] {
                let Some(point) = cursor.point_at(sample.distance) else {
                    continue;
                };
                frames.push(SimulationFrame {
                    point,
                    time_ms: self.clock_ms + sample.time_secs * 1000.0,
                    speed_mps: sample.speed_mps,
                    bearing: segment.bearing,
                    distance_to_next: 0.0,
                });
            }
            self.clock_ms += segment.plan.total_time() * 1000.0;
        }

        synthesize_bearings(&mut frames);
        for i in 0..frames.len().saturating_sub(1) {
            frames[i].distance_to_next = distance(frames[i].point, frames[i + 1].point);
        }

        self.clock_ms += sample_period_ms(options.frequency);
        self.driving = true;
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    fn options() -> SimulationOptions {
        SimulationOptions::builder()
            .frequency(10.0)
            .max_speed_mps(10.0)
            .max_acceleration(2.0)
            .min_acceleration(-2.0)
            .turn_speed_mps(3.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_driver_is_idle() {
        let driver = Driver::new();
        assert!(!driver.is_driving());
        assert_eq!(driver.clock_ms(), 0.0);
    }

    #[test]
    fn test_empty_input_leaves_clock_alone() {
        let mut driver = Driver::new();
        let frames = driver.drive_coordinates(&options(), &[]).unwrap();
        assert!(frames.is_empty());
        assert!(!driver.is_driving());
        assert_eq!(driver.clock_ms(), 0.0);
    }

    #[test]
    fn test_junction_samples_are_not_duplicated() {
        let a = GeoPoint::new(4.9, 52.37);
        let b = destination(a, 200.0, 0.0);
        let c = destination(b, 200.0, 90.0);
        let mut driver = Driver::new();
        let frames = driver.drive_coordinates(&options(), &[a, b, c]).unwrap();
        for w in frames.windows(2) {
            assert!(w[1].time_ms > w[0].time_ms);
            assert!(w[1].time_ms - w[0].time_ms <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let a = GeoPoint::new(4.9, 52.37);
        let b = destination(a, 100.0, 0.0);
        let mut driver = Driver::new();
        driver.drive_coordinates(&options(), &[a, b]).unwrap();
        assert!(driver.is_driving());
        assert!(driver.clock_ms() > 0.0);
        driver.reset();
        assert!(!driver.is_driving());
        assert_eq!(driver.clock_ms(), 0.0);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let mut o = options();
        o.frequency = 0.0;
        let mut driver = Driver::new();
        assert!(driver.drive_coordinates(&o, &[GeoPoint::new(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_distance_to_next_matches_frame_spacing() {
        let a = GeoPoint::new(4.9, 52.37);
        let b = destination(a, 150.0, 45.0);
        let mut driver = Driver::new();
        let frames = driver.drive_coordinates(&options(), &[a, b]).unwrap();
        let last = frames.last().unwrap();
        assert_eq!(last.distance_to_next, 0.0);
        let total: f64 = frames.iter().map(|f| f.distance_to_next).sum();
        assert!((total - 150.0).abs() < 0.01, "got {}", total);
    }
}
