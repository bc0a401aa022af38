use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::{
    distance::calculate_bounding_box,
    error::DiscoveryError,
    filters::matches,
    ranking::{annotate, apply_sort_order, rank},
};
use crate::models::{
    CandidateHint, Coordinate, DiscoveryResult, FilterCriteria, OriginRequest, ProximityQuery,
    ProximityRequest,
};
use crate::services::location::{LocationError, LocationProvider};
use crate::services::repository::ListingRepository;

/// Default cap on the number of results returned by one call
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Discovery orchestrator - implements the listing selection pipeline
///
/// # Pipeline Stages
/// 1. Resolve the origin (explicit, current location, or geocoded address)
/// 2. Fetch candidates, passing a pre-filter hint to the repository
/// 3. Filter every candidate against the criteria
/// 4. Rank by proximity when a radius search is requested
/// 5. Apply the criteria sort order unless distance ordering is in effect
/// 6. Truncate to the result cap
///
/// Holds no per-call state; one engine can serve concurrent requests.
#[derive(Clone)]
pub struct DiscoveryEngine {
    repository: Arc<dyn ListingRepository>,
    location: Arc<dyn LocationProvider>,
    max_results: usize,
}

impl DiscoveryEngine {
    pub fn new(repository: Arc<dyn ListingRepository>, location: Arc<dyn LocationProvider>) -> Self {
        Self {
            repository,
            location,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Discover listings matching `criteria`, optionally bounded by a radius
    ///
    /// # Arguments
    /// * `origin` - Where to measure distances from
    /// * `criteria` - Listing filter and non-distance sort order
    /// * `proximity` - Radius search; requires an origin
    /// * `cancel` - Aborts the origin lookup and the candidate fetch
    ///
    /// # Errors
    /// * `OriginUnavailable` - proximity requested but no origin could be resolved
    /// * `DiscoveryFailed` - the repository fetch failed
    /// * `InvalidCoordinate` - the origin or a listing coordinate is out of range
    /// * `Cancelled` - `cancel` fired before the call completed
    pub async fn discover(
        &self,
        origin: &OriginRequest,
        criteria: &FilterCriteria,
        proximity: Option<&ProximityRequest>,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        if proximity.is_some_and(|p| !p.has_valid_radius()) {
            return Ok(DiscoveryResult::empty());
        }

        // Stage 1: origin first; the candidate fetch is scoped by it
        let origin = self.resolve_origin(origin, proximity.is_some(), cancel).await?;
        let query: Option<ProximityQuery> = match (proximity, origin) {
            (Some(request), Some(origin)) => Some(request.at(origin)),
            (Some(_), None) => {
                return Err(DiscoveryError::OriginUnavailable(LocationError::Unavailable(
                    "no origin supplied for proximity search".to_string(),
                )))
            }
            (None, _) => None,
        };

        // Stage 2: candidates
        let bounding_box = query
            .as_ref()
            .and_then(|q| calculate_bounding_box(&q.origin, q.radius_km));
        let hint = CandidateHint::from_criteria(criteria, bounding_box);
        let candidates = until_cancelled(cancel, self.repository.fetch_candidates(Some(&hint)))
            .await?
            .map_err(DiscoveryError::DiscoveryFailed)?;
        let total_candidates = candidates.len();

        // Stage 3: full filter, whatever the repository did with the hint
        let eligible = candidates
            .into_iter()
            .filter(|listing| matches(listing, criteria));

        // Stages 4 & 5: proximity ranking, then the criteria sort order
        let mut results = match &query {
            Some(query) => {
                let mut ranked = rank(eligible, query)?;
                if !query.sort_by_distance {
                    apply_sort_order(&mut ranked, criteria.sort_order);
                }
                ranked
            }
            None => {
                let mut annotated = annotate(eligible, origin.as_ref())?;
                apply_sort_order(&mut annotated, criteria.sort_order);
                annotated
            }
        };

        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        // Stage 6: bound the result set
        let total_matched = results.len();
        results.truncate(self.max_results);

        Ok(DiscoveryResult {
            results,
            origin,
            total_candidates,
            total_matched,
        })
    }

    /// Resolve the requested origin
    ///
    /// A lookup failure is only an error when the origin is `required`;
    /// otherwise discovery continues without distances.
    async fn resolve_origin(
        &self,
        origin: &OriginRequest,
        required: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Coordinate>, DiscoveryError> {
        let lookup = match origin {
            OriginRequest::None => return Ok(None),
            OriginRequest::Coordinate(coordinate) => {
                coordinate.validate()?;
                return Ok(Some(*coordinate));
            }
            OriginRequest::CurrentLocation => {
                until_cancelled(cancel, self.location.current_location()).await?
            }
            OriginRequest::Address(address) => {
                until_cancelled(cancel, self.location.geocode(address)).await?
            }
        };

        match lookup {
            Ok(coordinate) => {
                coordinate.validate()?;
                Ok(Some(coordinate))
            }
            // Only "no answer" is optional; a broken lookup is always an error
            Err(LocationError::Unavailable(_) | LocationError::NotFound(_)) if !required => Ok(None),
            Err(e) => Err(DiscoveryError::OriginUnavailable(e)),
        }
    }
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine")
            .field("repository", &self.repository.source_name())
            .field("location", &self.location.provider_name())
            .field("max_results", &self.max_results)
            .finish()
    }
}

/// Await `fut` unless `cancel` fires first
async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, DiscoveryError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Listing, ListingStatus, Price, Region, SortOrder};
    use crate::services::memory::{FixedLocationProvider, InMemoryListingRepository};
    use crate::services::repository::RepositoryError;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn create_listing(id: u128, price: i64, coordinate: Option<(f64, f64)>) -> Listing {
        Listing {
            id: Uuid::from_u128(id),
            title: format!("Listing {}", id),
            description: "Test listing".to_string(),
            price: Price::new(Decimal::from(price)).unwrap(),
            category: Category::ForSale(None),
            region: Region::NewYork,
            coordinate: coordinate.map(|(lat, lon)| Coordinate::new_unchecked(lat, lon)),
            listed_at: Utc::now(),
            status: ListingStatus::Active,
        }
    }

    fn engine_with(listings: Vec<Listing>, current: Option<Coordinate>) -> DiscoveryEngine {
        DiscoveryEngine::new(
            Arc::new(InMemoryListingRepository::new(listings)),
            Arc::new(FixedLocationProvider::new(current)),
        )
    }

    fn ids(result: &DiscoveryResult) -> Vec<u128> {
        result.results.iter().map(|r| r.listing.id.as_u128()).collect()
    }

    struct FailingRepository;

    #[async_trait]
    impl ListingRepository for FailingRepository {
        async fn fetch_candidates(
            &self,
            _hint: Option<&CandidateHint>,
        ) -> Result<Vec<Listing>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".to_string()))
        }

        fn source_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_discover_criteria_sort() {
        let engine = engine_with(
            vec![create_listing(1, 10, None), create_listing(2, 30, None), create_listing(3, 20, None)],
            None,
        );
        let criteria = FilterCriteria::default().with_sort_order(SortOrder::PriceDesc);

        let result = engine
            .discover(&OriginRequest::None, &criteria, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![2, 3, 1]);
        assert!(result.results.iter().all(|r| r.distance_km.is_none()));
    }

    #[tokio::test]
    async fn test_discover_respects_max_results() {
        let listings = (0..10).map(|i| create_listing(i, 10, None)).collect();
        let engine = engine_with(listings, None).with_max_results(3);

        let result = engine
            .discover(&OriginRequest::None, &FilterCriteria::default(), None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.results.len(), 3);
        assert_eq!(result.total_matched, 10);
        assert_eq!(result.total_candidates, 10);
    }

    #[tokio::test]
    async fn test_invalid_radius_returns_empty() {
        let engine = engine_with(vec![create_listing(1, 10, Some((45.0, -75.0)))], None);

        let result = engine
            .discover(
                &OriginRequest::None,
                &FilterCriteria::default(),
                Some(&ProximityRequest::new(0.0, true)),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn test_proximity_without_origin_fails() {
        let engine = engine_with(vec![create_listing(1, 10, Some((45.0, -75.0)))], None);

        for origin in [OriginRequest::None, OriginRequest::CurrentLocation, OriginRequest::Address("nowhere".into())] {
            let err = engine
                .discover(
                    &origin,
                    &FilterCriteria::default(),
                    Some(&ProximityRequest::new(10.0, true)),
                    &CancellationToken::new(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DiscoveryError::OriginUnavailable(_)), "{:?}", origin);
        }
    }

    struct BrokenLocationProvider;

    #[async_trait]
    impl LocationProvider for BrokenLocationProvider {
        async fn current_location(&self) -> Result<Coordinate, LocationError> {
            Err(LocationError::InvalidResponse("missing lat".to_string()))
        }

        async fn geocode(&self, _address: &str) -> Result<Coordinate, LocationError> {
            Err(LocationError::InvalidResponse("missing lat".to_string()))
        }

        async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<String, LocationError> {
            Err(LocationError::InvalidResponse("missing display_name".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_optional_origin_failure_is_tolerated() {
        let engine = engine_with(vec![create_listing(1, 10, Some((45.0, -75.0)))], None);

        // Unavailable, then NotFound
        for origin in [OriginRequest::CurrentLocation, OriginRequest::Address("nowhere".into())] {
            let result = engine
                .discover(&origin, &FilterCriteria::default(), None, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(ids(&result), vec![1], "{:?}", origin);
            assert!(result.origin.is_none());
            assert!(result.results[0].distance_km.is_none());
        }
    }

    #[tokio::test]
    async fn test_broken_location_lookup_fails_without_proximity() {
        let engine = DiscoveryEngine::new(
            Arc::new(InMemoryListingRepository::new(vec![create_listing(1, 10, None)])),
            Arc::new(BrokenLocationProvider),
        );

        for origin in [OriginRequest::CurrentLocation, OriginRequest::Address("Ottawa".into())] {
            let err = engine
                .discover(&origin, &FilterCriteria::default(), None, &CancellationToken::new())
                .await
                .unwrap_err();

            assert!(
                matches!(err, DiscoveryError::OriginUnavailable(LocationError::InvalidResponse(_))),
                "{:?}",
                origin
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_explicit_origin() {
        let engine = engine_with(vec![], None);

        let err = engine
            .discover(
                &OriginRequest::Coordinate(Coordinate::new_unchecked(120.0, 0.0)),
                &FilterCriteria::default(),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::InvalidCoordinate(_)));
    }

    #[tokio::test]
    async fn test_repository_failure_surfaces() {
        let engine = DiscoveryEngine::new(
            Arc::new(FailingRepository),
            Arc::new(FixedLocationProvider::default()),
        );

        let err = engine
            .discover(&OriginRequest::None, &FilterCriteria::default(), None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::DiscoveryFailed(RepositoryError::Unavailable(_))));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let engine = engine_with(vec![create_listing(1, 10, None)], None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine
            .discover(&OriginRequest::None, &FilterCriteria::default(), None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::Cancelled));
    }
}
