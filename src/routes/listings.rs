use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use super::{error_response, AppState};
use crate::core::distance::{compass_point, initial_bearing};
use crate::core::DiscoveryError;
use crate::models::{
    DiscoverRequest, DiscoverResponse, DiscoveredListing, DiscoveryResult, HealthResponse,
};

/// Configure listing discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/listings/discover", web::post().to(discover));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (status, database) = match &state.postgres {
        Some(postgres) => {
            if postgres.health_check().await.unwrap_or(false) {
                ("healthy", "up")
            } else {
                ("degraded", "down")
            }
        }
        None => ("healthy", "unconfigured"),
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Discover listings endpoint
///
/// POST /api/v1/listings/discover
///
/// Request body:
/// ```json
/// {
///   "origin": { "latitude": 40.7128, "longitude": -74.0060 },
///   "categories": ["ForSale"],
///   "region": "NY",
///   "minPrice": "10.00",
///   "maxPrice": "250.00",
///   "searchText": "bike",
///   "sortOrder": "priceAsc",
///   "radiusKm": 15.0,
///   "sortByDistance": true,
///   "limit": 20
/// }
/// ```
async fn discover(state: web::Data<AppState>, req: web::Json<DiscoverRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for discover request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let origin = req.origin_request();
    let criteria = req.criteria();
    let proximity = req.proximity(state.default_radius_km);
    let limit = req.limit as usize;

    tracing::info!(
        "Discovering listings: origin={:?}, radius_km={:?}, sort_order={:?}",
        origin,
        proximity.map(|p| p.radius_km),
        criteria.sort_order
    );

    let cancel = CancellationToken::new();
    // A dropped request (client gone) cancels the pipeline
    let _guard = cancel.clone().drop_guard();

    let discovery = state
        .engine
        .discover(&origin, &criteria, proximity.as_ref(), &cancel);

    let outcome = match tokio::time::timeout(state.request_timeout, discovery).await {
        Ok(outcome) => outcome,
        Err(_) => {
            cancel.cancel();
            tracing::warn!("Discovery timed out after {:?}", state.request_timeout);
            return error_response(
                StatusCode::GATEWAY_TIMEOUT,
                "Discovery timed out",
                format!("No result within {}s", state.request_timeout.as_secs()),
            );
        }
    };

    match outcome {
        Ok(result) => {
            tracing::info!(
                "Returning {} of {} matched listings (from {} candidates)",
                result.results.len().min(limit),
                result.total_matched,
                result.total_candidates
            );
            HttpResponse::Ok().json(to_response(result, limit))
        }
        Err(e) => discovery_error(e),
    }
}

fn to_response(result: DiscoveryResult, limit: usize) -> DiscoverResponse {
    let origin = result.origin;

    let results = result
        .results
        .into_iter()
        .take(limit)
        .map(|ranked| {
            let direction = match (origin, ranked.listing.coordinate, ranked.distance_km) {
                (Some(from), Some(to), Some(distance)) if distance > 0.0 => initial_bearing(&from, &to)
                    .ok()
                    .map(|bearing| compass_point(bearing).to_string()),
                _ => None,
            };

            DiscoveredListing {
                listing: ranked.listing,
                distance_km: ranked.distance_km,
                direction,
            }
        })
        .collect();

    DiscoverResponse {
        results,
        origin,
        total_candidates: result.total_candidates,
        total_matched: result.total_matched,
    }
}

fn discovery_error(e: DiscoveryError) -> HttpResponse {
    match &e {
        DiscoveryError::InvalidCoordinate(_) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid coordinate", e.to_string())
        }
        DiscoveryError::OriginUnavailable(_) => {
            tracing::info!("Origin could not be resolved: {}", e);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "Origin unavailable", e.to_string())
        }
        DiscoveryError::DiscoveryFailed(_) => {
            tracing::error!("Listing repository failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch listings", e.to_string())
        }
        DiscoveryError::Cancelled => {
            error_response(StatusCode::GATEWAY_TIMEOUT, "Discovery cancelled", e.to_string())
        }
    }
}
