//! In-memory frame player
//!
//! Holds the simulated frames pushed by a route session and a playback
//! cursor over them (play/pause/seek/speed). Real-time pacing is done by the
//! playback task in [`crate::playback`].

use anyhow::{bail, Result};
use routesim_core::{ReplayPlayer, SimulationFrame};
use serde::Serialize;

/// Queue of simulated frames with a playback cursor
#[derive(Debug, Clone)]
pub struct FramePlayer {
    frames: Vec<SimulationFrame>,
    cursor: usize,
    playing: bool,
    playback_speed: f64,
}

impl FramePlayer {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            cursor: 0,
            playing: false,
            playback_speed: 1.0,
        }
    }

    pub fn frames(&self) -> &[SimulationFrame] {
        &self.frames
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Index of the next frame to play
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The frame at the cursor
    pub fn current_frame(&self) -> Option<&SimulationFrame> {
        self.frames.get(self.cursor)
    }

    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Move the cursor, clamped to the last frame
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.frames.len().saturating_sub(1));
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.playback_speed = speed.clamp(0.1, 16.0);
    }

    /// Hand out the frame at the cursor and step past it
    ///
    /// Returns None while paused. Running off the end pauses the player.
    pub fn advance(&mut self) -> Option<SimulationFrame> {
        if !self.playing {
            return None;
        }

        match self.frames.get(self.cursor) {
            Some(&frame) => {
                self.cursor += 1;
                Some(frame)
            }
            None => {
                self.playing = false;
                None
            }
        }
    }

    pub fn info(&self) -> PlayerInfo {
        let start_time_ms = self.frames.first().map(|f| f.time_ms);
        let end_time_ms = self.frames.last().map(|f| f.time_ms);
        PlayerInfo {
            total_frames: self.frames.len(),
            current_frame: self.cursor,
            playing: self.playing,
            playback_speed: self.playback_speed,
            start_time_ms,
            end_time_ms,
            duration_secs: match (start_time_ms, end_time_ms) {
                (Some(start), Some(end)) => (end - start) / 1000.0,
                _ => 0.0,
            },
        }
    }
}

impl Default for FramePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayPlayer for FramePlayer {
    fn clear_frames(&mut self) {
        self.frames.clear();
        self.cursor = 0;
        self.playing = false;
    }

    fn push_frames(&mut self, frames: Vec<SimulationFrame>) {
        let last_time = self.frames.last().map(|f| f.time_ms);
        let (queued, pushed) = (self.frames.len(), frames.len());
        self.frames.extend(
            frames
                .into_iter()
                .filter(|frame| last_time.map_or(true, |t| frame.time_ms >= t)),
        );
        let dropped = pushed - (self.frames.len() - queued);
        if dropped > 0 {
            tracing::warn!(dropped, "ignored frames older than the queue");
        }
    }

    fn seek_to(&mut self, frame: &SimulationFrame) -> Result<()> {
        match self.frames.iter().position(|f| f == frame) {
            Some(index) => {
                self.cursor = index;
                Ok(())
            }
            None => bail!("frame at {} ms was never pushed", frame.time_ms),
        }
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn remaining_frames(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

/// Serializable player summary
#[derive(Debug, Clone, Serialize)]
pub struct PlayerInfo {
    pub total_frames: usize,
    pub current_frame: usize,
    pub playing: bool,
    pub playback_speed: f64,
    pub start_time_ms: Option<f64>,
    pub end_time_ms: Option<f64>,
    pub duration_secs: f64,
}
