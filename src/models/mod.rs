// Model exports
pub mod criteria;
pub mod domain;
pub mod requests;
pub mod responses;

pub use criteria::{CandidateHint, DiscoveryResult, FilterCriteria, OriginRequest, ProximityQuery, ProximityRequest, RankedResult, SortOrder};
pub use domain::{BoundingBox, Category, CategoryKind, Coordinate, DomainError, ForSaleSubcategory, JobSubcategory, Listing, ListingStatus, Price, Region, RentalSubcategory, ServiceSubcategory};
pub use requests::{DiscoverRequest, GeocodeQuery, ReverseGeocodeQuery};
pub use responses::{DiscoverResponse, DiscoveredListing, ErrorResponse, GeocodeResponse, HealthResponse};
