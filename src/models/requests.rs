use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::criteria::{FilterCriteria, OriginRequest, ProximityRequest, SortOrder};
use crate::models::domain::{CategoryKind, Coordinate, Price, Region};

/// Request to discover listings
///
/// The origin is taken from `origin`, then `address`, then the current
/// location when `useCurrentLocation` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    #[serde(default)]
    pub origin: Option<Coordinate>,
    #[validate(length(min = 1, max = 256))]
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub use_current_location: bool,
    #[serde(default)]
    pub categories: Vec<CategoryKind>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub min_price: Option<Price>,
    #[serde(default)]
    pub max_price: Option<Price>,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub sort_by_distance: bool,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u16,
}

fn default_limit() -> u16 {
    20
}

impl DiscoverRequest {
    pub fn origin_request(&self) -> OriginRequest {
        if let Some(coordinate) = self.origin {
            OriginRequest::Coordinate(coordinate)
        } else if let Some(address) = &self.address {
            OriginRequest::Address(address.clone())
        } else if self.use_current_location {
            OriginRequest::CurrentLocation
        } else {
            OriginRequest::None
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            region: self.region,
            ..FilterCriteria::default()
        }
        .with_price_range(self.min_price, self.max_price)
        .with_categories(self.categories.iter().copied())
        .with_search_text(self.search_text.clone())
        .with_date_range(self.date_from, self.date_to)
        .with_sort_order(self.sort_order)
    }

    /// Proximity parameters; a distance sort without a radius uses `default_radius_km`
    pub fn proximity(&self, default_radius_km: f64) -> Option<ProximityRequest> {
        match (self.radius_km, self.sort_by_distance) {
            (Some(radius_km), sort) => Some(ProximityRequest::new(radius_km, sort)),
            (None, true) => Some(ProximityRequest::new(default_radius_km, true)),
            (None, false) => None,
        }
    }
}

/// Forward geocoding query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeocodeQuery {
    #[validate(length(min = 1, max = 256))]
    pub address: String,
}

/// Reverse geocoding query
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReverseGeocodeQuery {
    pub latitude: f64,
    pub longitude: f64,
}
