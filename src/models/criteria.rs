use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::distance::is_within_bounding_box;
use crate::core::filters;
use crate::models::domain::{BoundingBox, CategoryKind, Coordinate, Listing, Price, Region};

/// Result ordering applied when distance ordering is not in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Repository order
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    DateNewest,
    DateOldest,
}

/// Listing filter. Every unset field is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    /// Empty means every category
    pub categories: BTreeSet<CategoryKind>,
    pub region: Option<Region>,
    pub sort_order: SortOrder,
    /// Case-insensitive substring matched against title and description
    pub search_text: String,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    pub fn with_price_range(mut self, min: Option<Price>, max: Option<Price>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_categories<I: IntoIterator<Item = CategoryKind>>(mut self, categories: I) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Where `discover` should take its origin from
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OriginRequest {
    #[default]
    None,
    Coordinate(Coordinate),
    CurrentLocation,
    Address(String),
}

/// Radius search parameters before an origin is known
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityRequest {
    pub radius_km: f64,
    pub sort_by_distance: bool,
}

impl ProximityRequest {
    pub fn new(radius_km: f64, sort_by_distance: bool) -> Self {
        Self {
            radius_km,
            sort_by_distance,
        }
    }

    /// A non-positive or non-finite radius can match nothing
    #[inline]
    pub fn has_valid_radius(&self) -> bool {
        self.radius_km.is_finite() && self.radius_km > 0.0
    }

    pub fn at(&self, origin: Coordinate) -> ProximityQuery {
        ProximityQuery {
            origin,
            radius_km: self.radius_km,
            sort_by_distance: self.sort_by_distance,
        }
    }
}

/// Radius-bounded search around a known origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityQuery {
    pub origin: Coordinate,
    pub radius_km: f64,
    pub sort_by_distance: bool,
}

impl ProximityQuery {
    pub fn new(origin: Coordinate, radius_km: f64, sort_by_distance: bool) -> Self {
        Self {
            origin,
            radius_km,
            sort_by_distance,
        }
    }

    #[inline]
    pub fn has_valid_radius(&self) -> bool {
        self.radius_km.is_finite() && self.radius_km > 0.0
    }
}

/// A listing selected by discovery, with its distance from the origin when known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub listing: Listing,
    pub distance_km: Option<f64>,
}

/// Optional pre-filter passed to a listing repository
///
/// Carries the full criteria so a repository can apply every predicate and
/// the sort order at the source. Repositories may use any subset of it.
/// Callers must not assume it was applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateHint {
    pub criteria: FilterCriteria,
    pub active_only: bool,
    pub bounding_box: Option<BoundingBox>,
}

impl CandidateHint {
    pub fn from_criteria(criteria: &FilterCriteria, bounding_box: Option<BoundingBox>) -> Self {
        Self {
            criteria: criteria.clone(),
            active_only: true,
            bounding_box,
        }
    }

    /// Trimmed search text, if any
    pub fn search_text(&self) -> Option<&str> {
        Some(self.criteria.search_text.trim()).filter(|text| !text.is_empty())
    }

    /// Whether a listing passes this hint
    ///
    /// With a bounding box set, listings without a coordinate are rejected.
    pub fn admits(&self, listing: &Listing) -> bool {
        if self.active_only && !listing.is_active() {
            return false;
        }
        let criteria = &self.criteria;
        if !(filters::matches_price(listing, criteria)
            && filters::matches_category(listing, criteria)
            && filters::matches_region(listing, criteria)
            && filters::matches_text(listing, criteria)
            && filters::matches_date(listing, criteria))
        {
            return false;
        }
        match (&self.bounding_box, &listing.coordinate) {
            (None, _) => true,
            (Some(bbox), Some(coordinate)) => is_within_bounding_box(coordinate, bbox),
            (Some(_), None) => false,
        }
    }
}

/// Ordered, bounded output of one discovery call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryResult {
    pub results: Vec<RankedResult>,
    /// Origin distances were measured from, if one was resolved
    pub origin: Option<Coordinate>,
    /// Candidates returned by the repository
    pub total_candidates: usize,
    /// Results before truncation to the engine's limit
    pub total_matched: usize,
}

impl DiscoveryResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
