//! RouteSim Core Library
//!
//! This crate provides the shared data model, error taxonomy and player
//! contract used by the route replay simulator and its runtime edge.

pub mod error;
pub mod model;
pub mod player;
pub mod units;

pub use error::{SimError, SimResult};
pub use model::{
    GeoPoint, LegAnnotation, LegStep, RouteLeg, RouteProgress, SimulationFrame,
    SimulationOptions, SimulationOptionsBuilder,
};
pub use player::ReplayPlayer;
