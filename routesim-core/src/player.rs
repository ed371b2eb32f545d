//! Replay player trait definition

use crate::model::SimulationFrame;
use anyhow::Result;

/// Trait for players that replay simulated frames
///
/// The simulator never schedules playback itself. A player owns the frame
/// queue and the real-time pacing; the route session only:
/// - Clears the queue when the route changes
/// - Pushes freshly simulated frames
/// - Seeks to the frame matching the real navigation progress
/// - Resumes playback
pub trait ReplayPlayer: Send {
    /// Drop every queued frame and rewind
    fn clear_frames(&mut self);

    /// Append frames to the queue
    ///
    /// Frames arrive in clock order; a push never reorders frames that are
    /// already queued.
    fn push_frames(&mut self, frames: Vec<SimulationFrame>);

    /// Move the playback cursor to a previously pushed frame
    ///
    /// Returns an error if the frame was never pushed.
    fn seek_to(&mut self, frame: &SimulationFrame) -> Result<()>;

    /// Resume playback from the cursor
    fn play(&mut self);

    /// Number of queued frames not yet played, including the one at the cursor
    fn remaining_frames(&self) -> usize;
}
