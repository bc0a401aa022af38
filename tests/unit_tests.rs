// Unit tests for Classifieds Discovery

use chrono::{Duration, TimeZone, Utc};
use classifieds_discovery::core::{
    distance::{calculate_bounding_box, distance_km, haversine_distance, is_within_bounding_box},
    filters::{matches, matches_category, matches_date, matches_price, matches_text},
    ranking::{annotate, apply_sort_order, rank},
    GeoError,
};
use classifieds_discovery::models::{
    Category, CategoryKind, Coordinate, FilterCriteria, Listing, ListingStatus, Price,
    ProximityQuery, Region, RentalSubcategory, SortOrder,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn create_listing(id: u128, title: &str, price: Price, coordinate: Option<(f64, f64)>) -> Listing {
    Listing {
        id: Uuid::from_u128(id),
        title: title.to_string(),
        description: String::new(),
        price,
        category: Category::ForSale(None),
        region: Region::NewYork,
        coordinate: coordinate.map(|(lat, lon)| Coordinate::new_unchecked(lat, lon)),
        listed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        status: ListingStatus::Active,
    }
}

fn price(value: rust_decimal::Decimal) -> Price {
    Price::new(value).unwrap()
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(40.7128, -74.0060, 40.7128, -74.0060);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_manhattan_to_brooklyn() {
    // Manhattan to Brooklyn is approximately 5-10 km
    let manhattan = Coordinate::new(40.7580, -73.9855).unwrap();
    let brooklyn = Coordinate::new(40.6782, -73.9442).unwrap();

    let distance = distance_km(&manhattan, &brooklyn).unwrap();
    assert!(distance > 5.0 && distance < 15.0);
}

#[test]
fn test_distance_is_symmetric() {
    let ottawa = Coordinate::new(45.4215, -75.6972).unwrap();
    let montreal = Coordinate::new(45.5019, -73.5674).unwrap();

    let there = distance_km(&ottawa, &montreal).unwrap();
    let back = distance_km(&montreal, &ottawa).unwrap();
    assert!((there - back).abs() < 1e-9);
    assert!(there > 160.0 && there < 175.0);
}

#[test]
fn test_distance_rejects_out_of_range() {
    let valid = Coordinate::new(0.0, 0.0).unwrap();
    let invalid = Coordinate::new_unchecked(0.0, 181.0);

    assert!(matches!(
        distance_km(&valid, &invalid),
        Err(GeoError::InvalidCoordinate { .. })
    ));
}

#[test]
fn test_bounding_box_creation() {
    let center = Coordinate::new(40.7128, -74.0060).unwrap();
    let bbox = calculate_bounding_box(&center, 10.0).unwrap();

    assert!(bbox.min_lat < 40.7128);
    assert!(bbox.max_lat > 40.7128);
    assert!(bbox.min_lon < -74.0060);
    assert!(bbox.max_lon > -74.0060);

    // Bounding box should be roughly 0.18 degrees in latitude (10km / 111km per degree)
    let lat_span = bbox.max_lat - bbox.min_lat;
    assert!((lat_span - 0.18).abs() < 0.02);
}

#[test]
fn test_point_within_bbox() {
    let center = Coordinate::new(40.7128, -74.0060).unwrap();
    let bbox = calculate_bounding_box(&center, 10.0).unwrap();

    assert!(is_within_bounding_box(&center, &bbox));
    assert!(is_within_bounding_box(&Coordinate::new(40.71, -74.0).unwrap(), &bbox));
    assert!(!is_within_bounding_box(&Coordinate::new(50.0, -80.0).unwrap(), &bbox));
    assert!(!is_within_bounding_box(
        &Coordinate::new(bbox.max_lat + 0.01, -74.0).unwrap(),
        &bbox
    ));
}

#[test]
fn test_empty_criteria_match_only_active() {
    let criteria = FilterCriteria::default();
    let mut listing = create_listing(1, "Desk", price(dec!(80)), None);
    assert!(matches(&listing, &criteria));

    for status in [ListingStatus::Sold, ListingStatus::Rented, ListingStatus::Unavailable] {
        listing.status = status;
        assert!(!matches(&listing, &criteria));
    }
}

#[test]
fn test_price_bounds_are_inclusive() {
    let criteria = FilterCriteria::default()
        .with_price_range(Some(price(dec!(100))), Some(price(dec!(200))));

    let prices = [dec!(50), dec!(100), dec!(150), dec!(200), dec!(250)];
    let kept: Vec<_> = prices
        .iter()
        .filter(|p| matches_price(&create_listing(1, "x", price(**p), None), &criteria))
        .collect();

    assert_eq!(kept, vec![&dec!(100), &dec!(150), &dec!(200)]);
}

#[test]
fn test_category_filter_ignores_subcategory() {
    let criteria = FilterCriteria::default().with_categories([CategoryKind::Rental]);
    let mut listing = create_listing(1, "Studio", price(dec!(900)), None);

    assert!(!matches_category(&listing, &criteria));

    listing.category = Category::Rental(Some(RentalSubcategory::Apartment));
    assert!(matches_category(&listing, &criteria));
}

#[test]
fn test_text_search() {
    let mut listing = create_listing(1, "Garden Services", price(dec!(40)), None);
    listing.description = "Weekly MOWING and hedge trimming".to_string();

    assert!(matches_text(&listing, &FilterCriteria::default().with_search_text("garden")));
    assert!(matches_text(&listing, &FilterCriteria::default().with_search_text("mowing")));
    assert!(matches_text(&listing, &FilterCriteria::default().with_search_text("   ")));
    assert!(!matches_text(&listing, &FilterCriteria::default().with_search_text("plumbing")));
}

#[test]
fn test_date_range() {
    let listing = create_listing(1, "Bike", price(dec!(120)), None);
    let listed = listing.listed_at;

    let around = FilterCriteria::default()
        .with_date_range(Some(listed - Duration::days(1)), Some(listed + Duration::days(1)));
    let exact = FilterCriteria::default().with_date_range(Some(listed), Some(listed));
    let after = FilterCriteria::default().with_date_range(Some(listed + Duration::seconds(1)), None);

    assert!(matches_date(&listing, &around));
    assert!(matches_date(&listing, &exact));
    assert!(!matches_date(&listing, &after));
}

#[test]
fn test_rank_non_positive_radius_is_empty() {
    let origin = Coordinate::new(45.0, -75.0).unwrap();
    let listings = vec![create_listing(1, "a", price(dec!(1)), Some((45.0, -75.0)))];

    for radius in [0.0, -5.0, f64::NAN] {
        let ranked = rank(listings.clone(), &ProximityQuery::new(origin, radius, true)).unwrap();
        assert!(ranked.is_empty(), "radius {}", radius);
    }
}

#[test]
fn test_rank_sorts_by_distance() {
    let origin = Coordinate::new(45.0, -75.0).unwrap();
    let listings = vec![
        create_listing(1, "far", price(dec!(1)), Some((45.05, -75.0))),
        create_listing(2, "near", price(dec!(1)), Some((45.01, -75.0))),
        create_listing(3, "nowhere", price(dec!(1)), None),
        create_listing(4, "out", price(dec!(1)), Some((46.0, -75.0))),
    ];

    let ranked = rank(listings, &ProximityQuery::new(origin, 10.0, true)).unwrap();
    let ids: Vec<u128> = ranked.iter().map(|r| r.listing.id.as_u128()).collect();

    assert_eq!(ids, vec![2, 1]);
    assert!(ranked.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
}

#[test]
fn test_annotate_without_origin() {
    let listings = vec![create_listing(1, "a", price(dec!(1)), Some((45.0, -75.0)))];
    let annotated = annotate(listings, None).unwrap();

    assert_eq!(annotated.len(), 1);
    assert_eq!(annotated[0].distance_km, None);
}

#[test]
fn test_apply_sort_order_price_desc() {
    let listings = vec![
        create_listing(1, "a", price(dec!(10)), None),
        create_listing(2, "b", price(dec!(30)), None),
        create_listing(3, "c", price(dec!(20)), None),
    ];
    let mut results = annotate(listings, None).unwrap();

    apply_sort_order(&mut results, SortOrder::PriceDesc);

    let prices: Vec<_> = results.iter().map(|r| r.listing.price).collect();
    assert_eq!(prices, vec![price(dec!(30)), price(dec!(20)), price(dec!(10))]);
}

#[test]
fn test_apply_sort_order_dates() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let listings: Vec<Listing> = [3, 1, 2]
        .iter()
        .map(|day| {
            let mut listing = create_listing(*day as u128, "x", price(dec!(1)), None);
            listing.listed_at = base + Duration::days(*day);
            listing
        })
        .collect();

    let mut newest = annotate(listings.clone(), None).unwrap();
    apply_sort_order(&mut newest, SortOrder::DateNewest);
    let ids: Vec<u128> = newest.iter().map(|r| r.listing.id.as_u128()).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let mut oldest = annotate(listings, None).unwrap();
    apply_sort_order(&mut oldest, SortOrder::DateOldest);
    let ids: Vec<u128> = oldest.iter().map(|r| r.listing.id.as_u128()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_region_codes() {
    assert_eq!("ny".parse::<Region>().unwrap(), Region::NewYork);
    assert_eq!("District of Columbia".parse::<Region>().unwrap(), Region::DistrictOfColumbia);
    assert!("ZZ".parse::<Region>().is_err());
}
