//! Error taxonomy for the simulation pipeline

use thiserror::Error;

/// Errors raised by the pure simulation pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Malformed encoded polyline
    #[error("malformed polyline at byte {position}: {reason}")]
    Decode { position: usize, reason: &'static str },

    /// Caller broke a documented precondition
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// A strict segment transition that the acceleration bounds cannot meet
    #[error(
        "segment of {distance:.3}m cannot go from {start_speed:.3}m/s to {end_speed:.3}m/s within acceleration bounds"
    )]
    InfeasibleSegment {
        start_speed: f64,
        end_speed: f64,
        distance: f64,
    },
}

impl SimError {
    pub fn contract(message: impl Into<String>) -> Self {
        SimError::ContractViolation(message.into())
    }
}

pub type SimResult<T> = std::result::Result<T, SimError>;
