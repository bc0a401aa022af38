use async_trait::async_trait;
use thiserror::Error;

use crate::core::error::GeoError;
use crate::models::Coordinate;

/// Errors reported by a location provider
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("No location found for: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    InvalidCoordinate(#[from] GeoError),
}

/// Source of the caller's position plus forward and reverse geocoding
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current position of the caller
    async fn current_location(&self) -> Result<Coordinate, LocationError>;

    /// Resolve a free-form address to a coordinate
    async fn geocode(&self, address: &str) -> Result<Coordinate, LocationError>;

    /// Describe a coordinate as a human-readable address
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, LocationError>;

    /// Get the name of the provider
    fn provider_name(&self) -> &'static str;
}
