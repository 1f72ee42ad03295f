use crate::ring::DisposeFailures;
use crate::sys::HandleId;
use thiserror::Error;

/// Failure reported by a scene host or tween engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("Scene host error: {0}")]
    Scene(String),
    #[error("Tween engine error: {0}")]
    Tween(String),
    #[error("Handle {0} is not live")]
    StaleHandle(HandleId),
}

#[derive(Debug, Error)]
pub enum RingError {
    #[error("A ring needs at least one item")]
    Empty,
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("Disposal finished with {} host failure(s)", .0.len())]
    Dispose(DisposeFailures),
}
