use std::cmp::Ordering;

use crate::core::distance::distance_km;
use crate::core::error::GeoError;
use crate::models::{Coordinate, Listing, ProximityQuery, RankedResult, SortOrder};

/// Rank listings by proximity to the query origin
///
/// # Pipeline
/// 1. A non-positive radius matches nothing
/// 2. Listings without a coordinate are dropped
/// 3. Listings farther than `radius_km` are dropped
/// 4. Optional ascending distance sort (stable)
///
/// Without distance sorting the input order is kept as-is.
pub fn rank<I>(listings: I, query: &ProximityQuery) -> Result<Vec<RankedResult>, GeoError>
where
    I: IntoIterator<Item = Listing>,
{
    if !query.has_valid_radius() {
        return Ok(Vec::new());
    }
    query.origin.validate()?;

    let mut ranked = Vec::new();
    for listing in listings {
        let Some(coordinate) = listing.coordinate else {
            continue;
        };

        let distance = distance_km(&query.origin, &coordinate)?;
        if distance <= query.radius_km {
            ranked.push(RankedResult {
                listing,
                distance_km: Some(distance),
            });
        }
    }

    if query.sort_by_distance {
        ranked.sort_by(compare_distance);
    }

    Ok(ranked)
}

/// Attach distances from an optional origin without any radius bound
///
/// Listings keep their order; a distance is set only when both the origin
/// and the listing coordinate are known.
pub fn annotate<I>(listings: I, origin: Option<&Coordinate>) -> Result<Vec<RankedResult>, GeoError>
where
    I: IntoIterator<Item = Listing>,
{
    listings
        .into_iter()
        .map(|listing| {
            let distance = match (origin, listing.coordinate.as_ref()) {
                (Some(origin), Some(coordinate)) => Some(distance_km(origin, coordinate)?),
                _ => None,
            };
            Ok(RankedResult {
                listing,
                distance_km: distance,
            })
        })
        .collect()
}

/// Apply a non-distance sort order in place
///
/// Price orders break ties by listing id; date orders and `Relevance` keep
/// the incoming order for equal keys.
pub fn apply_sort_order(results: &mut [RankedResult], sort_order: SortOrder) {
    match sort_order {
        SortOrder::Relevance => {}
        SortOrder::PriceAsc => results.sort_by(|a, b| {
            a.listing
                .price
                .cmp(&b.listing.price)
                .then_with(|| a.listing.id.cmp(&b.listing.id))
        }),
        SortOrder::PriceDesc => results.sort_by(|a, b| {
            b.listing
                .price
                .cmp(&a.listing.price)
                .then_with(|| a.listing.id.cmp(&b.listing.id))
        }),
        SortOrder::DateNewest => results.sort_by(|a, b| b.listing.listed_at.cmp(&a.listing.listed_at)),
        SortOrder::DateOldest => results.sort_by(|a, b| a.listing.listed_at.cmp(&b.listing.listed_at)),
    }
}

fn compare_distance(a: &RankedResult, b: &RankedResult) -> Ordering {
    match (a.distance_km, b.distance_km) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
