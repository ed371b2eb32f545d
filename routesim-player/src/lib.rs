//! RouteSim Player Library
//!
//! Runtime edge of the simulator: an in-memory frame player, real-time
//! playback and the route session that keeps playback aligned with
//! navigation progress.

pub mod playback;
pub mod replay;
pub mod resync;
pub mod state;

pub use playback::{start_playback_task, stop_playback, PlayedFrame};
pub use replay::{FramePlayer, PlayerInfo};
pub use resync::{ReplayRouteSession, ReplaySessionOptions};
pub use state::PlayerState;
