//! Classifieds Discovery - geospatial discovery and filtering for classifieds listings
//!
//! This library selects and orders marketplace listings for a query: it
//! filters by price, category, region, text and date, bounds results by
//! great-circle distance from an origin, and sorts them. Storage and
//! geocoding sit behind the [`services::ListingRepository`] and
//! [`services::LocationProvider`] traits.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{distance::{calculate_bounding_box, distance_km, haversine_distance}, DiscoveryEngine, DiscoveryError, GeoError};
pub use models::{Coordinate, DiscoveryResult, FilterCriteria, Listing, OriginRequest, ProximityRequest, RankedResult, SortOrder};
