//! Route replay driving simulator
//!
//! Turns a path, either an encoded polyline or decoded coordinates, into a
//! time-ordered sequence of [`SimulationFrame`](routesim_core::SimulationFrame)s
//! that respect the configured speed and acceleration limits:
//!
//! geometry → [`polyline`] → [`smoother`] → [`speed_profile`] or [`traffic`]
//! → [`interpolator`] → [`bearing`], orchestrated by [`Driver`].

pub mod bearing;
pub mod demo;
pub mod driver;
pub mod geo;
pub mod interpolator;
pub mod mapper;
pub mod polyline;
pub mod smoother;
pub mod speed_profile;
pub mod traffic;

pub use driver::Driver;
pub use interpolator::{interpolate, interpolate_authoritative, SegmentPlan, SimulatedSample};
pub use mapper::RouteMapper;
pub use polyline::{encode, LegGeometryStream, PolylineDecoder};
pub use smoother::{distinct_points, smooth_route, SignificantPoint};
pub use speed_profile::build_speed_profile;
pub use traffic::{traffic_boundaries, TrafficBoundary};
