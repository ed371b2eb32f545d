//! Segment kinematics
//!
//! Splits one segment into speed-up, cruise and slow-down phases and samples
//! it at a fixed frequency. Accelerating phases follow
//! `r(t) = r0 + v0·t + ½·a·t²`; cruising is uniform motion.

use routesim_core::{SimError, SimResult, SimulationOptions};
use serde::Serialize;

/// Distances shorter than this are treated as zero
const MIN_PHASE_DISTANCE_M: f64 = 1e-6;

/// Slack allowed when checking a strict transition against the bounds
const FEASIBILITY_TOLERANCE_M: f64 = 1e-3;

/// One sample of the vehicle state within a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedSample {
    /// Seconds since the start of the segment
    pub time_secs: f64,
    pub acceleration: f64,
    pub speed_mps: f64,
    /// Meters from the start of the segment
    pub distance: f64,
}

/// How to treat a transition the acceleration bounds cannot meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// Fail with `SimError::InfeasibleSegment`
    Strict,
    /// Widen the acceleration until the transition fits the distance
    Authoritative,
}

/// Constant-acceleration stretch of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub start_time: f64,
    pub duration: f64,
    pub start_distance: f64,
    pub distance: f64,
    pub start_speed: f64,
    pub acceleration: f64,
}

impl Phase {
    fn new(start_time: f64, start_distance: f64, start_speed: f64, end_speed: f64, distance: f64, acceleration: f64) -> Self {
        let duration = if distance < MIN_PHASE_DISTANCE_M {
            0.0
        } else if acceleration == 0.0 {
            distance / start_speed
        } else {
            (end_speed - start_speed) / acceleration
        };
        Self {
            start_time,
            duration: duration.max(0.0),
            start_distance,
            distance: if duration > 0.0 { distance } else { 0.0 },
            start_speed,
            acceleration,
        }
    }

    fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    fn sample(&self, time_secs: f64) -> SimulatedSample {
        let t = (time_secs - self.start_time).clamp(0.0, self.duration);
        SimulatedSample {
            time_secs,
            acceleration: self.acceleration,
            speed_mps: (self.start_speed + self.acceleration * t).max(0.0),
            distance: self.start_distance + self.start_speed * t + 0.5 * self.acceleration * t * t,
        }
    }
}

/// The accelerate/cruise/decelerate split of one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    pub cruise_speed: f64,
    pub speed_up: Phase,
    pub cruise: Phase,
    pub slow_down: Phase,
    pub end_speed: f64,
    pub distance: f64,
}

impl SegmentPlan {
    /// Solve the phase split for one segment
    ///
    /// The cruise speed balances the distance spent accelerating from
    /// `start_speed` against the distance spent braking to `end_speed`,
    /// clamped to `[max(start_speed, end_speed), max_speed_mps]`.
    pub fn solve(
        options: &SimulationOptions,
        start_speed: f64,
        end_speed: f64,
        distance: f64,
        feasibility: Feasibility,
    ) -> SimResult<Self> {
        if [start_speed, end_speed, distance].iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SimError::contract(format!(
                "segment needs finite non-negative speeds and distance, got {} -> {} over {}",
                start_speed, end_speed, distance
            )));
        }

        let accel = options.max_acceleration;
        let brake = -options.min_acceleration;
        let floor = start_speed.max(end_speed);

        if distance < MIN_PHASE_DISTANCE_M {
            if feasibility == Feasibility::Strict && (start_speed - end_speed).abs() > MIN_PHASE_DISTANCE_M {
                return Err(SimError::InfeasibleSegment {
                    start_speed,
                    end_speed,
                    distance,
                });
            }
            return Ok(Self::stationary(end_speed, distance));
        }

        let balanced_sq = (distance + start_speed * start_speed / (2.0 * accel) + end_speed * end_speed / (2.0 * brake))
            / (1.0 / (2.0 * accel) + 1.0 / (2.0 * brake));
        let cruise_speed = balanced_sq.sqrt().min(options.max_speed_mps).max(floor);

        let mut up_distance = (cruise_speed * cruise_speed - start_speed * start_speed) / (2.0 * accel);
        let mut down_distance = (cruise_speed * cruise_speed - end_speed * end_speed) / (2.0 * brake);
        let mut up_accel = accel;
        let mut down_accel = -brake;

        let excess = up_distance + down_distance - distance;
        if excess > FEASIBILITY_TOLERANCE_M {
            if feasibility == Feasibility::Strict {
                return Err(SimError::InfeasibleSegment {
                    start_speed,
                    end_speed,
                    distance,
                });
            }
            // Only one of the phases is non-empty at the floor speed
            let needed = (end_speed * end_speed - start_speed * start_speed) / (2.0 * distance);
            tracing::warn!(
                start_speed,
                end_speed,
                distance,
                acceleration = needed,
                "transition exceeds acceleration bounds, widening"
            );
            if end_speed > start_speed {
                up_distance = distance;
                down_distance = 0.0;
                up_accel = needed;
            } else {
                up_distance = 0.0;
                down_distance = distance;
                down_accel = needed;
            }
        } else if excess > 0.0 {
            // Rounding at an exactly feasible transition
            let scale = distance / (up_distance + down_distance);
            up_distance *= scale;
            down_distance *= scale;
        }
        let cruise_distance = (distance - up_distance - down_distance).max(0.0);

        let speed_up = Phase::new(0.0, 0.0, start_speed, cruise_speed, up_distance, up_accel);
        let cruise = Phase::new(speed_up.end_time(), up_distance, cruise_speed, cruise_speed, cruise_distance, 0.0);
        let slow_down = Phase::new(
            cruise.end_time(),
            up_distance + cruise_distance,
            cruise_speed,
            end_speed,
            down_distance,
            down_accel,
        );

        Ok(Self {
            cruise_speed,
            speed_up,
            cruise,
            slow_down,
            end_speed,
            distance,
        })
    }

    fn stationary(speed: f64, distance: f64) -> Self {
        let phase = Phase {
            start_time: 0.0,
            duration: 0.0,
            start_distance: 0.0,
            distance: 0.0,
            start_speed: speed,
            acceleration: 0.0,
        };
        Self {
            cruise_speed: speed,
            speed_up: phase,
            cruise: phase,
            slow_down: phase,
            end_speed: speed,
            distance,
        }
    }

    pub fn total_time(&self) -> f64 {
        self.slow_down.end_time()
    }

    pub fn cruise_distance(&self) -> f64 {
        self.cruise.distance
    }

    fn sample_at(&self, time_secs: f64) -> SimulatedSample {
        let phase = [self.speed_up, self.cruise, self.slow_down]
            .into_iter()
            .find(|phase| phase.duration > 0.0 && time_secs < phase.end_time())
            .unwrap_or(self.slow_down);
        let mut sample = phase.sample(time_secs);
        sample.distance = sample.distance.min(self.distance);
        sample
    }

    /// Fixed-frequency samples, ending exactly at `(total_time, distance)`
    pub fn samples(&self, frequency: f64) -> Vec<SimulatedSample> {
        let period = 1.0 / frequency;
        let total = self.total_time();
        let mut samples = Vec::with_capacity((total * frequency).ceil() as usize + 1);

        let mut k = 0u64;
        loop {
            let t = k as f64 * period;
            // Also stops on a NaN total
            if !(t < total - 1e-9) {
                break;
            }
            samples.push(self.sample_at(t));
            k += 1;
        }

        let last_accel = [self.slow_down, self.cruise, self.speed_up]
            .into_iter()
            .find(|phase| phase.duration > 0.0)
            .map(|phase| phase.acceleration)
            .unwrap_or(0.0);
        samples.push(SimulatedSample {
            time_secs: total,
            acceleration: last_accel,
            speed_mps: self.end_speed,
            distance: self.distance,
        });
        samples
    }
}

/// Sample a segment whose transition must respect the acceleration bounds
pub fn interpolate(
    options: &SimulationOptions,
    start_speed: f64,
    end_speed: f64,
    distance: f64,
) -> SimResult<Vec<SimulatedSample>> {
    let plan = SegmentPlan::solve(options, start_speed, end_speed, distance, Feasibility::Strict)?;
    Ok(plan.samples(options.frequency))
}

/// Sample a segment whose speeds are ground truth, whatever acceleration it takes
pub fn interpolate_authoritative(
    options: &SimulationOptions,
    start_speed: f64,
    end_speed: f64,
    distance: f64,
) -> Vec<SimulatedSample> {
    SegmentPlan::solve(options, start_speed, end_speed, distance, Feasibility::Authoritative)
        .unwrap_or_else(|_| SegmentPlan::stationary(end_speed, distance))
        .samples(options.frequency)
}
