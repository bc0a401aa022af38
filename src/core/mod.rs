// Core algorithm exports
pub mod distance;
pub mod engine;
pub mod error;
pub mod filters;
pub mod ranking;

pub use distance::{calculate_bounding_box, distance_km, haversine_distance, initial_bearing, is_within_bounding_box};
pub use engine::DiscoveryEngine;
pub use error::{DiscoveryError, GeoError};
pub use filters::matches;
pub use ranking::{annotate, apply_sort_order, rank};
