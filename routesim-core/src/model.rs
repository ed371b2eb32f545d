//! Route replay data model
//!
//! Defines the geographic point, the simulation options, the frame that is
//! pushed to players, and the route shapes received from the route provider.
//!
//! Coordinates are WGS84 degrees; distances are meters, speeds m/s,
//! accelerations m/s², bearings degrees clockwise from north in [0, 360).

use crate::error::{SimError, SimResult};
use crate::units::{round4, round7};
use serde::{Deserialize, Serialize};

/// A longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(serialize_with = "round7")]
    pub lon: f64,
    #[serde(serialize_with = "round7")]
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

// =============================================================================
// Simulation options
// =============================================================================

/// Physical limits and sampling rate of a simulated vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Samples per second
    pub frequency: f64,

    /// Top speed on straight road
    pub max_speed_mps: f64,

    /// Braking limit, always negative
    pub min_acceleration: f64,

    /// Throttle limit, always positive
    pub max_acceleration: f64,

    /// Speed through a right-angle turn
    pub turn_speed_mps: f64,

    /// Speed through a u-turn
    pub u_turn_speed_mps: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            max_speed_mps: 30.0,
            min_acceleration: -4.0,
            max_acceleration: 3.0,
            turn_speed_mps: 3.0,
            u_turn_speed_mps: 1.0,
        }
    }
}

impl SimulationOptions {
    pub fn builder() -> SimulationOptionsBuilder {
        SimulationOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Check the sign and range preconditions of every field
    pub fn validate(&self) -> SimResult<()> {
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(SimError::contract(format!(
                "frequency must be positive, got {}",
                self.frequency
            )));
        }
        if !(self.min_acceleration < 0.0) {
            return Err(SimError::contract(format!(
                "min_acceleration must be negative, got {}",
                self.min_acceleration
            )));
        }
        if !(self.max_acceleration > 0.0) {
            return Err(SimError::contract(format!(
                "max_acceleration must be positive, got {}",
                self.max_acceleration
            )));
        }
        if !self.max_speed_mps.is_finite() || self.max_speed_mps <= 0.0 {
            return Err(SimError::contract(format!(
                "max_speed_mps must be positive, got {}",
                self.max_speed_mps
            )));
        }
        for (name, speed) in [
            ("turn_speed_mps", self.turn_speed_mps),
            ("u_turn_speed_mps", self.u_turn_speed_mps),
        ] {
            if !speed.is_finite() || speed < 0.0 {
                return Err(SimError::contract(format!(
                    "{} must be a non-negative speed, got {}",
                    name, speed
                )));
            }
        }
        for (name, speed) in [
            ("turn_speed_mps", self.turn_speed_mps),
            ("u_turn_speed_mps", self.u_turn_speed_mps),
        ] {
            if speed > self.max_speed_mps {
                return Err(SimError::contract(format!(
                    "{} {} exceeds max_speed_mps {}",
                    name, speed, self.max_speed_mps
                )));
            }
        }
        Ok(())
    }

    /// Sample period in seconds
    pub fn sample_period_secs(&self) -> f64 {
        1.0 / self.frequency
    }

    /// Copy of these options with the top speed replaced
    pub fn with_max_speed(&self, max_speed_mps: f64) -> Self {
        Self {
            max_speed_mps,
            ..*self
        }
    }
}

/// Builder for SimulationOptions
#[derive(Debug, Clone)]
pub struct SimulationOptionsBuilder {
    options: SimulationOptions,
}

impl SimulationOptionsBuilder {
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.options.frequency = frequency;
        self
    }

    pub fn max_speed_mps(mut self, speed: f64) -> Self {
        self.options.max_speed_mps = speed;
        self
    }

    pub fn min_acceleration(mut self, acceleration: f64) -> Self {
        self.options.min_acceleration = acceleration;
        self
    }

    pub fn max_acceleration(mut self, acceleration: f64) -> Self {
        self.options.max_acceleration = acceleration;
        self
    }

    pub fn turn_speed_mps(mut self, speed: f64) -> Self {
        self.options.turn_speed_mps = speed;
        self
    }

    pub fn u_turn_speed_mps(mut self, speed: f64) -> Self {
        self.options.u_turn_speed_mps = speed;
        self
    }

    pub fn build(self) -> SimResult<SimulationOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

// =============================================================================
// Frames
// =============================================================================

/// One simulated vehicle state, the unit pushed to players
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationFrame {
    pub point: GeoPoint,

    /// Absolute simulated clock time in milliseconds
    #[serde(serialize_with = "round4")]
    pub time_ms: f64,

    #[serde(serialize_with = "round4")]
    pub speed_mps: f64,

    #[serde(serialize_with = "round4")]
    pub bearing: f64,

    /// Distance to the following frame, 0 for the last frame of a drive
    #[serde(serialize_with = "round4")]
    pub distance_to_next: f64,
}

// =============================================================================
// Route provider shapes
// =============================================================================

/// A leg of a route, as delivered by the route provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    #[serde(default)]
    pub steps: Vec<LegStep>,

    #[serde(default)]
    pub annotation: Option<LegAnnotation>,
}

/// A maneuver step with its own encoded geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegStep {
    pub geometry: String,
}

/// Per-segment metadata parallel to the leg geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegAnnotation {
    /// Meters covered by each annotated segment
    #[serde(default)]
    pub distance: Option<Vec<f64>>,

    /// Expected m/s over each annotated segment
    #[serde(default)]
    pub speed: Option<Vec<f64>>,
}

impl RouteLeg {
    pub fn from_geometries<I, S>(geometries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: geometries
                .into_iter()
                .map(|g| LegStep { geometry: g.into() })
                .collect(),
            annotation: None,
        }
    }

    pub fn with_annotation(mut self, distance: Vec<f64>, speed: Vec<f64>) -> Self {
        self.annotation = Some(LegAnnotation {
            distance: Some(distance),
            speed: Some(speed),
        });
        self
    }

    /// Distance and speed annotation arrays, required for traffic drives
    pub fn traffic_annotation(&self) -> SimResult<(&[f64], &[f64])> {
        let annotation = self
            .annotation
            .as_ref()
            .ok_or_else(|| SimError::contract("leg has no annotation"))?;
        let distance = annotation
            .distance
            .as_deref()
            .ok_or_else(|| SimError::contract("leg annotation has no distance array"))?;
        let speed = annotation
            .speed
            .as_deref()
            .ok_or_else(|| SimError::contract("leg annotation has no speed array"))?;
        if distance.len() != speed.len() {
            return Err(SimError::contract(format!(
                "annotation distance ({}) and speed ({}) lengths differ",
                distance.len(),
                speed.len()
            )));
        }
        Ok((distance, speed))
    }

    pub fn has_traffic_annotation(&self) -> bool {
        matches!(self.traffic_annotation(), Ok((d, _)) if !d.is_empty())
    }
}

/// A real navigation progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    pub route_id: String,
    pub leg_index: usize,

    /// Meters traveled along the current leg
    pub distance_traveled: f64,

    pub leg: RouteLeg,
}

impl RouteProgress {
    /// Identity of the active route and leg
    pub fn identity(&self) -> (&str, usize) {
        (&self.route_id, self.leg_index)
    }
}
