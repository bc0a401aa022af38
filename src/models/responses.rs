use serde::{Deserialize, Serialize};

use crate::models::domain::{Coordinate, Listing};

/// Response for the discover endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub results: Vec<DiscoveredListing>,
    pub origin: Option<Coordinate>,
    pub total_candidates: usize,
    pub total_matched: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredListing {
    pub listing: Listing,
    pub distance_km: Option<f64>,
    /// Compass point from the origin, e.g. "NE"
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub address: String,
    pub coordinate: Coordinate,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// "up", "down" or "unconfigured"
    pub database: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
