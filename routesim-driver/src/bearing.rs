//! Frame bearings from a short look-ahead

use crate::geo::{bearing, distance};
use crate::smoother::DISTINCT_EPSILON_M;
use routesim_core::SimulationFrame;

/// Frames ahead used as the heading target
pub const LOOK_AHEAD: usize = 2;

/// Point every frame towards the frame `LOOK_AHEAD` positions later
///
/// Frames near the end look at the last frame. A frame whose target is the
/// same place (at rest, or the final frame) keeps the bearing of the frame
/// before it, so arrival does not snap the heading to north.
pub fn synthesize_bearings(frames: &mut [SimulationFrame]) {
    let n = frames.len();
    if n < 2 {
        return;
    }

    let mut previous: Option<f64> = None;
    for i in 0..n {
        let from = frames[i].point;
        let to = frames[(i + LOOK_AHEAD).min(n - 1)].point;
        if distance(from, to) > DISTINCT_EPSILON_M {
            frames[i].bearing = bearing(from, to);
        } else if let Some(heading) = previous {
            frames[i].bearing = heading;
        }
        previous = Some(frames[i].bearing);
    }
}
