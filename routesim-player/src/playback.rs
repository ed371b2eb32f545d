//! Real-time playback of queued frames
//!
//! The playback task walks the shared [`FramePlayer`](crate::replay::FramePlayer)
//! and broadcasts each frame, sleeping for the simulated time between
//! consecutive frames divided by the playback speed.

use crate::state::PlayerState;
use chrono::{DateTime, Utc};
use routesim_core::{ReplayPlayer, SimulationFrame};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Poll interval while the player is paused
const PAUSED_POLL_MS: u64 = 50;

/// A frame as it was played out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayedFrame {
    pub played_at: DateTime<Utc>,
    pub frame: SimulationFrame,
}

/// Spawn the playback task, cancelling any previous one
///
/// The task ends when cancelled or once the player has played every queued
/// frame.
pub async fn start_playback_task(state: PlayerState) -> JoinHandle<()> {
    let cancel_token = {
        let mut cancel = state.playback_cancel.write().await;
        if let Some(token) = cancel.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        *cancel = Some(token.clone());
        token
    };

    let tx = state.frames_tx.clone();
    let player = state.player.clone();

    tokio::spawn(async move {
        tracing::info!("Playback task started");
        let mut played = 0usize;

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let (frame, next_time_ms, playback_speed) = {
                let mut player = player.write().await;
                if !player.is_playing() {
                    if player.remaining_frames() == 0 {
                        break;
                    }
                    (None, None, player.playback_speed())
                } else {
                    let frame = player.advance();
                    let next_time_ms = player.current_frame().map(|f| f.time_ms);
                    (frame, next_time_ms, player.playback_speed())
                }
            };

            let Some(frame) = frame else {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(PAUSED_POLL_MS)) => {},
                }
                continue;
            };

            // No receivers is not an error, frames are simply dropped
            let _ = tx.send(PlayedFrame {
                played_at: Utc::now(),
                frame,
            });
            played += 1;

            let interval_ms = next_time_ms
                .map(|next| ((next - frame.time_ms) / playback_speed).max(1.0))
                .unwrap_or(1.0);
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_micros((interval_ms * 1000.0) as u64)) => {},
            }
        }

        tracing::info!(played, "Playback task ended");
    })
}

/// Cancel the running playback task, if any
pub async fn stop_playback(state: &PlayerState) {
    let mut cancel = state.playback_cancel.write().await;
    if let Some(token) = cancel.take() {
        token.cancel();
    }
}
