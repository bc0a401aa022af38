use crate::core::error::GeoError;
use crate::models::{BoundingBox, Coordinate};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Two coordinates closer than this on both axes are the same point
const SAME_POINT_TOLERANCE_DEG: f64 = 1e-9;

/// Kilometers per degree of latitude
const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two validated coordinates in kilometers
///
/// Symmetric and non-negative. Returns exactly `0.0` when both components
/// differ by no more than 1e-9 degrees.
///
/// # Errors
/// `GeoError::InvalidCoordinate` if either input is out of range.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> Result<f64, GeoError> {
    a.validate()?;
    b.validate()?;

    if (a.latitude() - b.latitude()).abs() <= SAME_POINT_TOLERANCE_DEG
        && (a.longitude() - b.longitude()).abs() <= SAME_POINT_TOLERANCE_DEG
    {
        return Ok(0.0);
    }

    Ok(haversine_distance(
        a.latitude(),
        a.longitude(),
        b.latitude(),
        b.longitude(),
    ))
}

/// Calculate the Haversine distance between two points in kilometers
///
/// No range checking; prefer [`distance_km`] for untrusted input.
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial great-circle bearing from `from` towards `to`, in degrees [0, 360)
pub fn initial_bearing(from: &Coordinate, to: &Coordinate) -> Result<f64, GeoError> {
    from.validate()?;
    to.validate()?;

    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lon = (to.longitude() - from.longitude()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    Ok(y.atan2(x).to_degrees().rem_euclid(360.0))
}

/// Eight-point compass name for a bearing in degrees
pub fn compass_point(bearing: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    POINTS[index]
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
///
/// Returns `None` when the box would reach past a pole or across the
/// antimeridian, since a single min/max box cannot describe that area.
pub fn calculate_bounding_box(center: &Coordinate, radius_km: f64) -> Option<BoundingBox> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return None;
    }

    let lat = center.latitude();
    let lon = center.longitude();

    let lat_delta = radius_km / KM_PER_DEGREE;
    if lat + lat_delta >= Coordinate::MAX_LATITUDE || lat - lat_delta <= -Coordinate::MAX_LATITUDE {
        return None;
    }

    // Widest longitude span is at the edge of the box nearest a pole
    let widest_lat = lat.abs() + lat_delta;
    let lon_delta = radius_km / (KM_PER_DEGREE * widest_lat.to_radians().cos());
    if lon + lon_delta > Coordinate::MAX_LONGITUDE || lon - lon_delta < -Coordinate::MAX_LONGITUDE {
        return None;
    }

    Some(BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    })
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: &Coordinate, bbox: &BoundingBox) -> bool {
    point.latitude() >= bbox.min_lat
        && point.latitude() <= bbox.max_lat
        && point.longitude() >= bbox.min_lon
        && point.longitude() <= bbox.max_lon
}
