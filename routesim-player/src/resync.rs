//! Keeps simulated playback aligned with real navigation progress
//!
//! A [`ReplayRouteSession`] watches route progress notifications. When the
//! active route or leg changes it drives the new leg, replaces the player's
//! queue and seeks to the frame matching the distance already traveled.
//! Long legs driven by curvature are decoded in distance windows; call
//! [`ReplayRouteSession::push_more`] to queue the next window.

use anyhow::{Context, Result};
use routesim_core::{
    ReplayPlayer, RouteProgress, SimError, SimResult, SimulationFrame, SimulationOptions,
};
use routesim_driver::{LegGeometryStream, RouteMapper};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration of a replay route session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySessionOptions {
    pub simulation: SimulationOptions,

    /// Decimal digits of the leg geometry encoding
    pub polyline_precision: u32,

    /// Length of each decoded geometry window
    pub decode_min_distance_km: f64,

    /// Prefer the leg's traffic annotation over curvature speeds
    pub use_traffic: bool,
}

impl Default for ReplaySessionOptions {
    fn default() -> Self {
        Self {
            simulation: SimulationOptions::default(),
            polyline_precision: 6,
            decode_min_distance_km: 100.0,
            use_traffic: true,
        }
    }
}

impl ReplaySessionOptions {
    pub fn builder() -> ReplaySessionOptionsBuilder {
        ReplaySessionOptionsBuilder {
            options: Self::default(),
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        self.simulation.validate()?;
        if !matches!(self.polyline_precision, 5 | 6) {
            return Err(SimError::contract(format!(
                "polyline_precision must be 5 or 6, got {}",
                self.polyline_precision
            )));
        }
        if !self.decode_min_distance_km.is_finite() || self.decode_min_distance_km <= 0.0 {
            return Err(SimError::contract(format!(
                "decode_min_distance_km must be positive, got {}",
                self.decode_min_distance_km
            )));
        }
        Ok(())
    }
}

/// Builder for ReplaySessionOptions
#[derive(Debug, Clone)]
pub struct ReplaySessionOptionsBuilder {
    options: ReplaySessionOptions,
}

impl ReplaySessionOptionsBuilder {
    pub fn simulation(mut self, simulation: SimulationOptions) -> Self {
        self.options.simulation = simulation;
        self
    }

    pub fn polyline_precision(mut self, precision: u32) -> Self {
        self.options.polyline_precision = precision;
        self
    }

    pub fn decode_min_distance_km(mut self, km: f64) -> Self {
        self.options.decode_min_distance_km = km;
        self
    }

    pub fn use_traffic(mut self, use_traffic: bool) -> Self {
        self.options.use_traffic = use_traffic;
        self
    }

    pub fn build(self) -> SimResult<ReplaySessionOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

/// Route session that resynchronizes a player with navigation progress
pub struct ReplayRouteSession {
    options: ReplaySessionOptions,
    mapper: RouteMapper,
    active: Option<(String, usize)>,
    stream: Option<LegGeometryStream>,
}

impl ReplayRouteSession {
    pub fn new(options: ReplaySessionOptions) -> Result<Self> {
        options.validate().context("invalid replay session options")?;
        Ok(Self {
            mapper: RouteMapper::new(options.simulation)?,
            options,
            active: None,
            stream: None,
        })
    }

    pub fn options(&self) -> &ReplaySessionOptions {
        &self.options
    }

    /// Replace the options; the next progress update drives the leg again
    pub fn set_options(&mut self, options: ReplaySessionOptions) -> Result<()> {
        options.validate().context("invalid replay session options")?;
        self.mapper.set_options(options.simulation)?;
        self.options = options;
        self.active = None;
        self.stream = None;
        Ok(())
    }

    /// Route and leg the queued frames belong to
    pub fn active_route(&self) -> Option<(&str, usize)> {
        self.active.as_ref().map(|(route, leg)| (route.as_str(), *leg))
    }

    /// Clock of the simulated vehicle
    pub fn clock_ms(&self) -> f64 {
        self.mapper.driver().clock_ms()
    }

    /// React to a navigation progress update
    ///
    /// Returns the index the player was seeked to, or None when nothing was
    /// pushed (same route and leg as before, or nothing to drive). On error
    /// the player and the session are left as they were.
    pub fn on_route_progress(
        &mut self,
        progress: &RouteProgress,
        player: &mut dyn ReplayPlayer,
    ) -> Result<Option<usize>> {
        if self.active_route() == Some(progress.identity()) {
            return Ok(None);
        }

        info!(
            route = %progress.route_id,
            leg = progress.leg_index,
            distance_traveled = progress.distance_traveled,
            "Route changed, resynchronizing replay"
        );

        let mut mapper = self.mapper.clone();
        mapper.driver_mut().reset();
        let (frames, stream) = self
            .drive_progress(&mut mapper, progress)
            .with_context(|| format!("failed to simulate route {} leg {}", progress.route_id, progress.leg_index))?;

        self.mapper = mapper;
        self.stream = stream;
        self.active = Some((progress.route_id.clone(), progress.leg_index));

        player.clear_frames();
        if frames.is_empty() {
            debug!("Leg has nothing to drive");
            return Ok(None);
        }

        let index = seek_index(&frames, progress.distance_traveled);
        let target = frames[index];
        let total = frames.len();
        player.push_frames(frames);
        player.seek_to(&target)?;
        player.play();

        debug!(frames = total, seek_index = index, "Pushed resynchronized frames");
        Ok(Some(index))
    }

    fn drive_progress(
        &self,
        mapper: &mut RouteMapper,
        progress: &RouteProgress,
    ) -> SimResult<(Vec<SimulationFrame>, Option<LegGeometryStream>)> {
        let precision = self.options.polyline_precision;
        if self.options.use_traffic && progress.leg.has_traffic_annotation() {
            let simulation = *mapper.options();
            let frames = mapper
                .driver_mut()
                .drive_leg_with_traffic(&simulation, &progress.leg, precision)?;
            return Ok((frames, None));
        }

        let mut stream = LegGeometryStream::new(&progress.leg, precision);
        let window_km = self.options.decode_min_distance_km + progress.distance_traveled.max(0.0) / 1000.0;
        let points = stream.decode(window_km)?;
        let frames = mapper.map_points(&points)?;
        Ok((frames, Some(stream)))
    }

    /// Queue the next geometry window of the active leg
    ///
    /// Returns how many frames were pushed; 0 once the leg is exhausted.
    pub fn push_more(&mut self, player: &mut dyn ReplayPlayer) -> Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        if !stream.has_next() {
            return Ok(0);
        }

        let points = stream
            .decode(self.options.decode_min_distance_km)
            .context("failed to decode the next geometry window")?;
        let frames = self.mapper.map_points(&points)?;
        let pushed = frames.len();
        if pushed > 0 {
            player.push_frames(frames);
            player.play();
        }

        debug!(pushed, clock_ms = self.mapper.driver().clock_ms(), "Pushed next window");
        Ok(pushed)
    }

    /// Forget the active route and empty the player
    pub fn reset(&mut self, player: &mut dyn ReplayPlayer) {
        self.active = None;
        self.stream = None;
        self.mapper.driver_mut().reset();
        player.clear_frames();
    }
}

/// First frame whose distance along the frames reaches `distance_traveled`
///
/// Clamped to the last frame. `frames` must not be empty.
pub fn seek_index(frames: &[SimulationFrame], distance_traveled: f64) -> usize {
    let mut covered = 0.0;
    for (i, frame) in frames.iter().enumerate() {
        if covered >= distance_traveled {
            return i;
        }
        covered += frame.distance_to_next;
    }
    frames.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use routesim_core::GeoPoint;

    fn frames(spacing: &[f64]) -> Vec<SimulationFrame> {
        spacing
            .iter()
            .enumerate()
            .map(|(i, &d)| SimulationFrame {
                point: GeoPoint::new(0.0, 0.0),
                time_ms: i as f64 * 1000.0,
                speed_mps: 0.0,
                bearing: 0.0,
                distance_to_next: d,
            })
            .collect()
    }

    #[test]
    fn test_seek_index() {
        let f = frames(&[10.0, 10.0, 10.0, 0.0]);
        assert_eq!(seek_index(&f, 0.0), 0);
        assert_eq!(seek_index(&f, 5.0), 1);
        assert_eq!(seek_index(&f, 10.0), 1);
        assert_eq!(seek_index(&f, 25.0), 3);
        assert_eq!(seek_index(&f, 1_000.0), 3);
    }

    #[test]
    fn test_options_validation() {
        assert!(ReplaySessionOptions::default().validate().is_ok());
        assert!(ReplaySessionOptions::builder().polyline_precision(7).build().is_err());
        assert!(ReplaySessionOptions::builder().decode_min_distance_km(0.0).build().is_err());
        let options = ReplaySessionOptions::builder()
            .polyline_precision(5)
            .use_traffic(false)
            .build()
            .unwrap();
        assert_eq!(options.polyline_precision, 5);
        assert!(!options.use_traffic);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ReplaySessionOptions =
            serde_json::from_str(r#"{"decode_min_distance_km": 2.5}"#).unwrap();
        assert_eq!(options.decode_min_distance_km, 2.5);
        assert_eq!(options.polyline_precision, 6);
        assert!(options.use_traffic);
    }
}
