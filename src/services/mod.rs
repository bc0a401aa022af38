// Service exports
pub mod cache;
pub mod geocoding;
pub mod location;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CachingLocationProvider};
pub use geocoding::HttpGeocoder;
pub use location::{LocationError, LocationProvider};
pub use memory::{FixedLocationProvider, InMemoryListingRepository};
pub use postgres::PostgresListingRepository;
pub use repository::{ListingRepository, RepositoryError};
