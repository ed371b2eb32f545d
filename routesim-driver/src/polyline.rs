//! Streaming encoded-polyline codec
//!
//! Decodes the standard polyline format (signed varints of 5-bit groups,
//! continuation bit 0x20, zig-zag sign, scaled by 10^precision) one
//! coordinate at a time, so long routes can be consumed in distance windows
//! instead of being materialized up front.
//!
//! See [Google's polyline
//! algorithm](https://developers.google.com/maps/documentation/utilities/polylinealgorithm).

use crate::geo::distance;
use routesim_core::{GeoPoint, LegStep, RouteLeg, SimError, SimResult};
use std::collections::VecDeque;

const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
const ASCII_OFFSET: u8 = 63;
// Only 4 bits of a 64-bit accumulator are left for the group at this shift
const MAX_SHIFT: u32 = 60;

/// Forward-only decoder over one encoded polyline
#[derive(Debug, Clone)]
pub struct PolylineDecoder {
    encoded: Vec<u8>,
    position: usize,
    factor: f64,
    lat: i64,
    lon: i64,
    current: Option<GeoPoint>,
    error: Option<SimError>,
}

impl PolylineDecoder {
    pub fn new(encoded: impl Into<String>, precision: u32) -> Self {
        Self {
            encoded: encoded.into().into_bytes(),
            position: 0,
            factor: 10f64.powi(precision as i32),
            lat: 0,
            lon: 0,
            current: None,
            error: None,
        }
    }

    /// Whether another coordinate can be decoded
    pub fn has_next(&self) -> bool {
        self.error.is_none() && self.position < self.encoded.len()
    }

    /// The most recently decoded coordinate
    pub fn current(&self) -> Option<GeoPoint> {
        self.current
    }

    /// Decode exactly one coordinate
    ///
    /// A malformed input poisons the decoder: the same error is returned by
    /// every later call instead of decoding from a corrupted offset.
    pub fn next_point(&mut self) -> SimResult<GeoPoint> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.position >= self.encoded.len() {
            return Err(SimError::Decode {
                position: self.position,
                reason: "no coordinates left",
            });
        }

        let decoded = self
            .read_value()
            .and_then(|dlat| self.read_value().map(|dlon| (dlat, dlon)));
        let accumulated = decoded.and_then(|(dlat, dlon)| {
            match (self.lat.checked_add(dlat), self.lon.checked_add(dlon)) {
                (Some(lat), Some(lon)) => Ok((lat, lon)),
                _ => Err(SimError::Decode {
                    position: self.position,
                    reason: "coordinate overflow",
                }),
            }
        });
        match accumulated {
            Ok((lat, lon)) => {
                self.lat = lat;
                self.lon = lon;
                let point = GeoPoint::new(self.lon as f64 / self.factor, self.lat as f64 / self.factor);
                self.current = Some(point);
                Ok(point)
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Decode until at least `min_distance_km` of path has been covered
    ///
    /// The previously current coordinate is prepended so consecutive windows
    /// join without a gap. Pass `f64::INFINITY` to decode everything left.
    pub fn decode(&mut self, min_distance_km: f64) -> SimResult<Vec<GeoPoint>> {
        let min_distance_m = min_distance_km * 1000.0;
        let mut points: Vec<GeoPoint> = self.current.into_iter().collect();
        let mut covered = 0.0;

        while self.has_next() && covered < min_distance_m {
            let previous = self.current;
            let point = self.next_point()?;
            if let Some(previous) = previous {
                covered += distance(previous, point);
            }
            points.push(point);
        }

        Ok(points)
    }

    /// Skip up to `count` coordinates, returning how many were skipped
    pub fn skip(&mut self, count: usize) -> SimResult<usize> {
        let mut skipped = 0;
        while skipped < count && self.has_next() {
            self.next_point()?;
            skipped += 1;
        }
        Ok(skipped)
    }

    fn read_value(&mut self) -> SimResult<i64> {
        let mut result: i64 = 0;
        let mut shift: u32 = 0;

        loop {
            let byte = *self.encoded.get(self.position).ok_or(SimError::Decode {
                position: self.position,
                reason: "unterminated coordinate",
            })?;
            if !(ASCII_OFFSET..=ASCII_OFFSET + 63).contains(&byte) {
                return Err(SimError::Decode {
                    position: self.position,
                    reason: "character outside the polyline alphabet",
                });
            }
            let chunk = (byte - ASCII_OFFSET) as i64;
            let overflows = shift > MAX_SHIFT
                || (shift == MAX_SHIFT && (chunk & CONTINUATION_BIT != 0 || chunk & CHUNK_MASK > 0xf));
            if overflows {
                return Err(SimError::Decode {
                    position: self.position,
                    reason: "coordinate overflow",
                });
            }
            self.position += 1;

            result |= (chunk & CHUNK_MASK) << shift;
            shift += 5;
            if chunk & CONTINUATION_BIT == 0 {
                break;
            }
        }

        let magnitude = ((result as u64) >> 1) as i64;
        Ok(if result & 1 != 0 { !magnitude } else { magnitude })
    }
}

impl Iterator for PolylineDecoder {
    type Item = SimResult<GeoPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_point())
        } else {
            None
        }
    }
}

/// Encode coordinates as a polyline at the given precision
pub fn encode(points: &[GeoPoint], precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    let mut encoded = String::new();
    let mut last_lat = 0i64;
    let mut last_lon = 0i64;

    for point in points {
        let lat = (point.lat * factor).round() as i64;
        let lon = (point.lon * factor).round() as i64;
        encode_value(lat - last_lat, &mut encoded);
        encode_value(lon - last_lon, &mut encoded);
        last_lat = lat;
        last_lon = lon;
    }

    encoded
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= CONTINUATION_BIT {
        out.push((((CONTINUATION_BIT | (v & CHUNK_MASK)) as u8) + ASCII_OFFSET) as char);
        v >>= 5;
    }
    out.push(((v as u8) + ASCII_OFFSET) as char);
}

/// Incremental decoder over every step geometry of a leg, in order
#[derive(Debug, Clone)]
pub struct LegGeometryStream {
    pending: VecDeque<String>,
    decoder: Option<PolylineDecoder>,
    precision: u32,
    current: Option<GeoPoint>,
}

impl LegGeometryStream {
    pub fn new(leg: &RouteLeg, precision: u32) -> Self {
        Self {
            pending: leg.steps.iter().map(|LegStep { geometry }| geometry.clone()).collect(),
            decoder: None,
            precision,
            current: None,
        }
    }

    pub fn has_next(&mut self) -> bool {
        loop {
            if let Some(decoder) = &self.decoder {
                if decoder.has_next() {
                    return true;
                }
            }
            match self.pending.pop_front() {
                Some(geometry) => self.decoder = Some(PolylineDecoder::new(geometry, self.precision)),
                None => return false,
            }
        }
    }

    pub fn current(&self) -> Option<GeoPoint> {
        self.current
    }

    fn next_point(&mut self) -> SimResult<Option<GeoPoint>> {
        if !self.has_next() {
            return Ok(None);
        }
        match self.decoder.as_mut() {
            Some(decoder) => {
                let point = decoder.next_point()?;
                self.current = Some(point);
                Ok(Some(point))
            }
            None => Ok(None),
        }
    }

    /// Decode across steps until `min_distance_km` has been covered
    ///
    /// Same continuity contract as [`PolylineDecoder::decode`].
    pub fn decode(&mut self, min_distance_km: f64) -> SimResult<Vec<GeoPoint>> {
        let min_distance_m = min_distance_km * 1000.0;
        let mut points: Vec<GeoPoint> = self.current.into_iter().collect();
        let mut covered = 0.0;

        while covered < min_distance_m {
            let previous = self.current;
            let Some(point) = self.next_point()? else {
                break;
            };
            if let Some(previous) = previous {
                covered += distance(previous, point);
            }
            points.push(point);
        }

        Ok(points)
    }

    /// Decode whatever is left of the leg
    pub fn decode_all(&mut self) -> SimResult<Vec<GeoPoint>> {
        self.decode(f64::INFINITY)
    }
}
