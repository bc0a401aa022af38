use crate::models::{FilterCriteria, Listing};

/// Check whether a listing satisfies every filter criterion
///
/// Conjunction of the independent predicates below. An unset criterion
/// always passes; non-active listings never do.
#[inline]
pub fn matches(listing: &Listing, criteria: &FilterCriteria) -> bool {
    listing.is_active()
        && matches_price(listing, criteria)
        && matches_category(listing, criteria)
        && matches_region(listing, criteria)
        && matches_text(listing, criteria)
        && matches_date(listing, criteria)
}

/// Price within `[min_price, max_price]`, inclusive
#[inline]
pub fn matches_price(listing: &Listing, criteria: &FilterCriteria) -> bool {
    if let Some(min) = criteria.min_price {
        if listing.price < min {
            return false;
        }
    }

    if let Some(max) = criteria.max_price {
        if listing.price > max {
            return false;
        }
    }

    true
}

#[inline]
pub fn matches_category(listing: &Listing, criteria: &FilterCriteria) -> bool {
    criteria.categories.is_empty() || criteria.categories.contains(&listing.category.kind())
}

#[inline]
pub fn matches_region(listing: &Listing, criteria: &FilterCriteria) -> bool {
    criteria.region.map_or(true, |region| listing.region == region)
}

/// Case-insensitive substring match against title or description
///
/// Whitespace-only search text counts as empty.
pub fn matches_text(listing: &Listing, criteria: &FilterCriteria) -> bool {
    let needle = criteria.search_text.trim();
    if needle.is_empty() {
        return true;
    }

    let needle = needle.to_lowercase();
    listing.title.to_lowercase().contains(&needle)
        || listing.description.to_lowercase().contains(&needle)
}

/// Listing timestamp within `[date_from, date_to]`, inclusive
#[inline]
pub fn matches_date(listing: &Listing, criteria: &FilterCriteria) -> bool {
    if let Some(from) = criteria.date_from {
        if listing.listed_at < from {
            return false;
        }
    }

    if let Some(to) = criteria.date_to {
        if listing.listed_at > to {
            return false;
        }
    }

    true
}
