// Route exports
pub mod geocode;
pub mod listings;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;
use std::time::Duration;

use crate::core::DiscoveryEngine;
use crate::models::ErrorResponse;
use crate::services::{LocationProvider, PostgresListingRepository};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: DiscoveryEngine,
    pub location: Arc<dyn LocationProvider>,
    /// Checked by the health endpoint when present
    pub postgres: Option<Arc<PostgresListingRepository>>,
    pub default_radius_km: f64,
    pub request_timeout: Duration,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(listings::configure)
            .configure(geocode::configure),
    );
}

pub(crate) fn error_response(status: StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}
