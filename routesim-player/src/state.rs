//! Shared player state

use crate::playback::PlayedFrame;
use crate::replay::FramePlayer;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

/// State shared between the route session, the playback task and consumers
#[derive(Clone)]
pub struct PlayerState {
    /// Frame queue and playback cursor
    pub player: Arc<RwLock<FramePlayer>>,

    /// Broadcast channel for played frames
    /// Multiple consumers can subscribe to receive frames
    pub frames_tx: broadcast::Sender<PlayedFrame>,

    /// Cancellation token for the playback task
    pub playback_cancel: Arc<RwLock<Option<CancellationToken>>>,
}

impl PlayerState {
    pub fn new() -> Self {
        let (frames_tx, _) = broadcast::channel(256);

        Self {
            player: Arc::new(RwLock::new(FramePlayer::new())),
            frames_tx,
            playback_cancel: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to played frames
    pub fn subscribe(&self) -> broadcast::Receiver<PlayedFrame> {
        self.frames_tx.subscribe()
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}
