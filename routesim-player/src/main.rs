//! RouteSim demo replay
//!
//! Drives the demo circuit through a route session and prints every played
//! frame to stdout as one JSON object per line.

use anyhow::Result;
use routesim_core::{ReplayPlayer, SimulationOptions};
use routesim_driver::demo::{demo_progress, DEMO_PRECISION};
use routesim_player::{start_playback_task, stop_playback, PlayerState, ReplayRouteSession, ReplaySessionOptions};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Queue the next window once this few frames are left to play
const REFILL_THRESHOLD: usize = 10;

const PLAYBACK_SPEED: f64 = 8.0;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting RouteSim demo replay");

    let options = ReplaySessionOptions::builder()
        .simulation(SimulationOptions::builder().frequency(2.0).build()?)
        .polyline_precision(DEMO_PRECISION)
        .decode_min_distance_km(0.5)
        .use_traffic(false)
        .build()?;
    let mut session = ReplayRouteSession::new(options)?;

    let state = PlayerState::new();
    {
        let mut player = state.player.write().await;
        player.set_speed(PLAYBACK_SPEED);
        session.on_route_progress(&demo_progress(0.0), &mut *player)?;
    }

    let mut frames_rx = state.subscribe();
    let mut playback = start_playback_task(state.clone()).await;

    loop {
        tokio::select! {
            received = frames_rx.recv() => match received {
                Ok(played) => {
                    println!("{}", serde_json::to_string(&played)?);
                    let mut player = state.player.write().await;
                    if player.remaining_frames() <= REFILL_THRESHOLD {
                        session.push_more(&mut *player)?;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Output fell behind playback"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut playback => {
                while let Ok(played) = frames_rx.try_recv() {
                    println!("{}", serde_json::to_string(&played)?);
                }
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                stop_playback(&state).await;
                break;
            }
        }
    }

    info!(clock_ms = session.clock_ms(), "Demo replay finished");
    Ok(())
}
