use thiserror::Error;

use crate::services::location::LocationError;
use crate::services::repository::RepositoryError;

/// Errors raised by coordinate math
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Errors surfaced by [`DiscoveryEngine::discover`](crate::core::DiscoveryEngine::discover)
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    InvalidCoordinate(#[from] GeoError),

    #[error("Origin unavailable: {0}")]
    OriginUnavailable(#[source] LocationError),

    #[error("Discovery failed: {0}")]
    DiscoveryFailed(#[source] RepositoryError),

    #[error("Discovery cancelled")]
    Cancelled,
}
