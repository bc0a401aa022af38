use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use super::{error_response, AppState};
use crate::models::{Coordinate, GeocodeQuery, GeocodeResponse, ReverseGeocodeQuery};
use crate::services::LocationError;

/// Configure geocoding routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/geocode", web::get().to(geocode))
        .route("/geocode/reverse", web::get().to(reverse_geocode));
}

/// Forward geocoding
///
/// GET /api/v1/geocode?address={address}
async fn geocode(state: web::Data<AppState>, query: web::Query<GeocodeQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    match state.location.geocode(&query.address).await {
        Ok(coordinate) => HttpResponse::Ok().json(GeocodeResponse {
            address: query.address.clone(),
            coordinate,
        }),
        Err(e) => location_error(e),
    }
}

/// Reverse geocoding
///
/// GET /api/v1/geocode/reverse?latitude={lat}&longitude={lon}
async fn reverse_geocode(
    state: web::Data<AppState>,
    query: web::Query<ReverseGeocodeQuery>,
) -> impl Responder {
    let coordinate = match Coordinate::new(query.latitude, query.longitude) {
        Ok(coordinate) => coordinate,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid coordinate", e.to_string()),
    };

    match state.location.reverse_geocode(coordinate).await {
        Ok(address) => HttpResponse::Ok().json(GeocodeResponse { address, coordinate }),
        Err(e) => location_error(e),
    }
}

fn location_error(e: LocationError) -> HttpResponse {
    match &e {
        LocationError::NotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Location not found", e.to_string())
        }
        LocationError::InvalidCoordinate(_) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid coordinate", e.to_string())
        }
        LocationError::Unavailable(_)
        | LocationError::RequestError(_)
        | LocationError::InvalidResponse(_) => {
            tracing::error!("Geocoding failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "Geocoding unavailable", e.to_string())
        }
    }
}
