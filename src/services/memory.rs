use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::distance::distance_km;
use crate::models::{CandidateHint, Coordinate, Listing};
use crate::services::location::{LocationError, LocationProvider};
use crate::services::repository::{ListingRepository, RepositoryError};

/// Reverse lookups only resolve to a known place this close to it
const REVERSE_MATCH_KM: f64 = 1.0;

/// Listing repository backed by a vector, in insertion order
///
/// Applies the candidate hint, so it behaves like a database-backed
/// repository for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryListingRepository {
    listings: Arc<RwLock<Vec<Listing>>>,
}

impl InMemoryListingRepository {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings: Arc::new(RwLock::new(listings)),
        }
    }

    pub async fn insert(&self, listing: Listing) {
        self.listings.write().await.push(listing);
    }

    /// Set or clear the coordinate of a listing. Returns false if the id is unknown.
    pub async fn set_coordinate(&self, id: Uuid, coordinate: Option<Coordinate>) -> bool {
        let mut listings = self.listings.write().await;
        match listings.iter_mut().find(|listing| listing.id == id) {
            Some(listing) => {
                listing.coordinate = coordinate;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn fetch_candidates(
        &self,
        hint: Option<&CandidateHint>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        let listings = self.listings.read().await;
        let candidates = match hint {
            Some(hint) => listings.iter().filter(|l| hint.admits(l)).cloned().collect(),
            None => listings.clone(),
        };
        Ok(candidates)
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

/// Location provider with a fixed current position and a table of known places
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    current: Option<Coordinate>,
    places: HashMap<String, Coordinate>,
}

impl FixedLocationProvider {
    pub fn new(current: Option<Coordinate>) -> Self {
        Self {
            current,
            places: HashMap::new(),
        }
    }

    pub fn with_place(mut self, address: &str, coordinate: Coordinate) -> Self {
        self.places.insert(normalize(address), coordinate);
        self
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        self.current
            .ok_or_else(|| LocationError::Unavailable("no current location configured".to_string()))
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate, LocationError> {
        self.places
            .get(&normalize(address))
            .copied()
            .ok_or_else(|| LocationError::NotFound(address.to_string()))
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, LocationError> {
        let mut nearest: Option<(&String, f64)> = None;
        for (name, place) in &self.places {
            let distance = distance_km(&coordinate, place)?;
            if distance <= REVERSE_MATCH_KM && nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((name, distance));
            }
        }

        nearest
            .map(|(name, _)| name.clone())
            .ok_or_else(|| LocationError::NotFound(coordinate.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryKind, FilterCriteria, ListingStatus, Price, Region};
    use chrono::Utc;

    fn listing(category: Category, status: ListingStatus, coordinate: Option<Coordinate>) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: "Bike".to_string(),
            description: String::new(),
            price: Price::ZERO,
            category,
            region: Region::Oregon,
            coordinate,
            listed_at: Utc::now(),
            status,
        }
    }

    #[tokio::test]
    async fn test_fetch_applies_hint() {
        let portland = Coordinate::new(45.5152, -122.6784).unwrap();
        let repo = InMemoryListingRepository::new(vec![
            listing(Category::ForSale(None), ListingStatus::Active, Some(portland)),
            listing(Category::ForSale(None), ListingStatus::Sold, Some(portland)),
            listing(Category::Job(None), ListingStatus::Active, Some(portland)),
            listing(Category::ForSale(None), ListingStatus::Active, None),
        ]);

        assert_eq!(repo.fetch_candidates(None).await.unwrap().len(), 4);

        let hint = CandidateHint::from_criteria(
            &FilterCriteria::default().with_categories([CategoryKind::ForSale]),
            None,
        );
        assert_eq!(repo.fetch_candidates(Some(&hint)).await.unwrap().len(), 2);

        let hint = CandidateHint {
            bounding_box: crate::core::distance::calculate_bounding_box(&portland, 10.0),
            ..hint
        };
        assert_eq!(repo.fetch_candidates(Some(&hint)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_applies_price_and_text_hint() {
        let mut cheap = listing(Category::ForSale(None), ListingStatus::Active, None);
        cheap.price = Price::new(rust_decimal::Decimal::from(20)).unwrap();
        let mut garden = listing(Category::Service(None), ListingStatus::Active, None);
        garden.title = "Garden Services".to_string();
        garden.price = Price::new(rust_decimal::Decimal::from(150)).unwrap();
        let repo = InMemoryListingRepository::new(vec![cheap, garden]);

        let criteria = FilterCriteria::default()
            .with_price_range(Some(Price::new(rust_decimal::Decimal::from(100)).unwrap()), None)
            .with_search_text("  GARDEN ");
        let hint = CandidateHint::from_criteria(&criteria, None);

        assert_eq!(hint.search_text(), Some("GARDEN"));
        let fetched = repo.fetch_candidates(Some(&hint)).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].title, "Garden Services");
    }

    #[tokio::test]
    async fn test_set_coordinate() {
        let item = listing(Category::ForSale(None), ListingStatus::Active, None);
        let id = item.id;
        let repo = InMemoryListingRepository::new(vec![item]);

        let spot = Coordinate::new(10.0, 10.0).unwrap();
        assert!(repo.set_coordinate(id, Some(spot)).await);
        assert!(!repo.set_coordinate(Uuid::new_v4(), Some(spot)).await);

        let fetched = repo.fetch_candidates(None).await.unwrap();
        assert_eq!(fetched[0].coordinate, Some(spot));
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let ottawa = Coordinate::new(45.4215, -75.6972).unwrap();
        let provider = FixedLocationProvider::new(None).with_place("Ottawa", ottawa);

        assert!(matches!(
            provider.current_location().await,
            Err(LocationError::Unavailable(_))
        ));
        assert_eq!(provider.geocode("  OTTAWA ").await.unwrap(), ottawa);
        assert!(matches!(
            provider.geocode("Atlantis").await,
            Err(LocationError::NotFound(_))
        ));
        assert_eq!(provider.reverse_geocode(ottawa).await.unwrap(), "ottawa");
    }
}
