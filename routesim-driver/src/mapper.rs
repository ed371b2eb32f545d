//! Geometry to frames in one call

use routesim_core::{GeoPoint, RouteLeg, SimResult, SimulationFrame, SimulationOptions};

use crate::driver::Driver;
use crate::polyline::{LegGeometryStream, PolylineDecoder};

/// A [`Driver`] bundled with the options it drives with
#[derive(Debug, Clone)]
pub struct RouteMapper {
    options: SimulationOptions,
    driver: Driver,
}

impl RouteMapper {
    pub fn new(options: SimulationOptions) -> SimResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            driver: Driver::new(),
        })
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SimulationOptions) -> SimResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    /// Decode a whole encoded polyline and drive it
    pub fn map_geometry(&mut self, encoded: &str, precision: u32) -> SimResult<Vec<SimulationFrame>> {
        let points = PolylineDecoder::new(encoded, precision).decode(f64::INFINITY)?;
        self.map_points(&points)
    }

    pub fn map_points(&mut self, points: &[GeoPoint]) -> SimResult<Vec<SimulationFrame>> {
        self.driver.drive_coordinates(&self.options, points)
    }

    /// Drive a leg by its traffic annotation when it has a usable one,
    /// otherwise by curvature
    pub fn map_leg(&mut self, leg: &RouteLeg, precision: u32) -> SimResult<Vec<SimulationFrame>> {
        if leg.has_traffic_annotation() {
            return self.driver.drive_leg_with_traffic(&self.options, leg, precision);
        }
        let points = LegGeometryStream::new(leg, precision).decode_all()?;
        self.map_points(&points)
    }
}
