use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::core::error::GeoError;

/// Errors raised while building domain values from untrusted input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Price {0} is negative")]
    NegativePrice(Decimal),

    #[error("Price {0} exceeds the maximum of {}", Price::MAX)]
    PriceTooLarge(Decimal),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown subcategory '{subcategory}' for category {category}")]
    UnknownSubcategory {
        category: CategoryKind,
        subcategory: String,
    },

    #[error("Unknown region code: {0}")]
    UnknownRegion(String),

    #[error("Unknown listing status: {0}")]
    UnknownStatus(String),
}

/// A WGS-84 coordinate in decimal degrees
///
/// Values built through [`Coordinate::new`] are range-checked. Values coming
/// from storage or the wire may be out of range; the distance functions
/// reject them when they are used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub const MAX_LATITUDE: f64 = 90.0;
    pub const MAX_LONGITUDE: f64 = 180.0;

    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coordinate = Self::new_unchecked(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Builds a coordinate without range checks.
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Fails with `InvalidCoordinate` when either component is out of range or NaN
    pub fn validate(&self) -> Result<(), GeoError> {
        let lat_ok = self.latitude.abs() <= Self::MAX_LATITUDE;
        let lon_ok = self.longitude.abs() <= Self::MAX_LONGITUDE;
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Listing price in the marketplace currency
///
/// Always within `[0, Price::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// 999,999,999.99
    pub const MAX: Self = Self(Decimal::from_parts(1_215_752_191, 23, 0, false, 2));

    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::NegativePrice(value));
        }
        if value > Self::MAX.0 {
            return Err(DomainError::PriceTooLarge(value));
        }
        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Price::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

/// Top-level category without its subcategory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    ForSale,
    Rental,
    Job,
    Service,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 4] = [
        CategoryKind::ForSale,
        CategoryKind::Rental,
        CategoryKind::Job,
        CategoryKind::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::ForSale => "ForSale",
            CategoryKind::Rental => "Rental",
            CategoryKind::Job => "Job",
            CategoryKind::Service => "Service",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownCategory(s.to_string()))
    }
}

/// Declares a subcategory enum with its canonical string names.
macro_rules! subcategory {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn parse(s: &str) -> Option<Self> {
                match s {
                    $(t if t.eq_ignore_ascii_case($text) => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

subcategory!(ForSaleSubcategory {
    Appliances => "Appliances",
    Books => "Books",
    Clothing => "Clothing",
    Electronics => "Electronics",
    Furniture => "Furniture",
    Sports => "Sports",
    Toys => "Toys",
    Vehicles => "Vehicles",
    Other => "Other",
});

subcategory!(RentalSubcategory {
    Apartment => "Apartment",
    House => "House",
    Room => "Room",
    Office => "Office",
    Storage => "Storage",
    Vehicle => "Vehicle",
    Equipment => "Equipment",
});

subcategory!(JobSubcategory {
    FullTime => "FullTime",
    PartTime => "PartTime",
    Contract => "Contract",
    Temporary => "Temporary",
    Internship => "Internship",
    Volunteer => "Volunteer",
});

subcategory!(ServiceSubcategory {
    Cleaning => "Cleaning",
    Repair => "Repair",
    Moving => "Moving",
    Tutoring => "Tutoring",
    Landscaping => "Landscaping",
    Beauty => "Beauty",
    Other => "Other",
});

/// Listing category with an optional subcategory scoped to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "subcategory")]
pub enum Category {
    ForSale(Option<ForSaleSubcategory>),
    Rental(Option<RentalSubcategory>),
    Job(Option<JobSubcategory>),
    Service(Option<ServiceSubcategory>),
}

impl Category {
    pub fn kind(&self) -> CategoryKind {
        match self {
            Category::ForSale(_) => CategoryKind::ForSale,
            Category::Rental(_) => CategoryKind::Rental,
            Category::Job(_) => CategoryKind::Job,
            Category::Service(_) => CategoryKind::Service,
        }
    }

    pub fn subcategory_name(&self) -> Option<&'static str> {
        match self {
            Category::ForSale(sub) => sub.map(|s| s.as_str()),
            Category::Rental(sub) => sub.map(|s| s.as_str()),
            Category::Job(sub) => sub.map(|s| s.as_str()),
            Category::Service(sub) => sub.map(|s| s.as_str()),
        }
    }

    /// Rebuilds a category from its stored `(category, subcategory)` columns
    pub fn from_parts(category: &str, subcategory: Option<&str>) -> Result<Self, DomainError> {
        let kind: CategoryKind = category.parse()?;
        let sub = subcategory.map(str::trim).filter(|s| !s.is_empty());
        let unknown = |s: &str| DomainError::UnknownSubcategory {
            category: kind,
            subcategory: s.to_string(),
        };

        Ok(match (kind, sub) {
            (CategoryKind::ForSale, None) => Category::ForSale(None),
            (CategoryKind::Rental, None) => Category::Rental(None),
            (CategoryKind::Job, None) => Category::Job(None),
            (CategoryKind::Service, None) => Category::Service(None),
            (CategoryKind::ForSale, Some(s)) => {
                Category::ForSale(Some(ForSaleSubcategory::parse(s).ok_or_else(|| unknown(s))?))
            }
            (CategoryKind::Rental, Some(s)) => {
                Category::Rental(Some(RentalSubcategory::parse(s).ok_or_else(|| unknown(s))?))
            }
            (CategoryKind::Job, Some(s)) => {
                Category::Job(Some(JobSubcategory::parse(s).ok_or_else(|| unknown(s))?))
            }
            (CategoryKind::Service, Some(s)) => {
                Category::Service(Some(ServiceSubcategory::parse(s).ok_or_else(|| unknown(s))?))
            }
        })
    }
}

/// Declares the region enum from `(variant, postal code, display name)` rows.
macro_rules! regions {
    ($($variant:ident => $code:literal, $name:literal;)+) => {
        /// US state (or DC) a listing is posted in
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Region {
            $($variant),+
        }

        impl Region {
            pub const ALL: &'static [Region] = &[$(Region::$variant),+];

            /// Two-letter postal code
            pub fn code(&self) -> &'static str {
                match self {
                    $(Region::$variant => $code),+
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Region::$variant => $name),+
                }
            }
        }
    };
}

regions! {
    Alabama => "AL", "Alabama";
    Alaska => "AK", "Alaska";
    Arizona => "AZ", "Arizona";
    Arkansas => "AR", "Arkansas";
    California => "CA", "California";
    Colorado => "CO", "Colorado";
    Connecticut => "CT", "Connecticut";
    Delaware => "DE", "Delaware";
    DistrictOfColumbia => "DC", "District of Columbia";
    Florida => "FL", "Florida";
    Georgia => "GA", "Georgia";
    Hawaii => "HI", "Hawaii";
    Idaho => "ID", "Idaho";
    Illinois => "IL", "Illinois";
    Indiana => "IN", "Indiana";
    Iowa => "IA", "Iowa";
    Kansas => "KS", "Kansas";
    Kentucky => "KY", "Kentucky";
    Louisiana => "LA", "Louisiana";
    Maine => "ME", "Maine";
    Maryland => "MD", "Maryland";
    Massachusetts => "MA", "Massachusetts";
    Michigan => "MI", "Michigan";
    Minnesota => "MN", "Minnesota";
    Mississippi => "MS", "Mississippi";
    Missouri => "MO", "Missouri";
    Montana => "MT", "Montana";
    Nebraska => "NE", "Nebraska";
    Nevada => "NV", "Nevada";
    NewHampshire => "NH", "New Hampshire";
    NewJersey => "NJ", "New Jersey";
    NewMexico => "NM", "New Mexico";
    NewYork => "NY", "New York";
    NorthCarolina => "NC", "North Carolina";
    NorthDakota => "ND", "North Dakota";
    Ohio => "OH", "Ohio";
    Oklahoma => "OK", "Oklahoma";
    Oregon => "OR", "Oregon";
    Pennsylvania => "PA", "Pennsylvania";
    RhodeIsland => "RI", "Rhode Island";
    SouthCarolina => "SC", "South Carolina";
    SouthDakota => "SD", "South Dakota";
    Tennessee => "TN", "Tennessee";
    Texas => "TX", "Texas";
    Utah => "UT", "Utah";
    Vermont => "VT", "Vermont";
    Virginia => "VA", "Virginia";
    Washington => "WA", "Washington";
    WestVirginia => "WV", "West Virginia";
    Wisconsin => "WI", "Wisconsin";
    Wyoming => "WY", "Wyoming";
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    /// Accepts either the postal code or the full name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.code().eq_ignore_ascii_case(s) || r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownRegion(s.to_string()))
    }
}

impl Serialize for Region {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Rented,
    Unavailable,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Rented => "rented",
            ListingStatus::Unavailable => "unavailable",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "sold" => Ok(ListingStatus::Sold),
            "rented" => Ok(ListingStatus::Rented),
            "unavailable" => Ok(ListingStatus::Unavailable),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}

/// Marketplace listing as supplied by a listing repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Price,
    #[serde(flatten)]
    pub category: Category,
    pub region: Region,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    pub listed_at: DateTime<Utc>,
    pub status: ListingStatus,
}

impl Listing {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_bounds() {
        assert!(Price::new(dec!(0)).is_ok());
        assert!(Price::new(dec!(150.25)).is_ok());
        assert_eq!(Price::MAX.as_decimal(), dec!(999999999.99));
        assert!(Price::new(dec!(999999999.99)).is_ok());
        assert_eq!(
            Price::new(dec!(-0.01)),
            Err(DomainError::NegativePrice(dec!(-0.01)))
        );
        assert!(matches!(
            Price::new(dec!(1000000000)),
            Err(DomainError::PriceTooLarge(_))
        ));
    }

    #[test]
    fn test_price_deserialize_rejects_negative() {
        let ok: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(ok.as_decimal(), dec!(19.99));
        assert!(serde_json::from_str::<Price>("\"-5\"").is_err());
    }

    #[test]
    fn test_price_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("250").unwrap();
        let from_string: Price = serde_json::from_str("\"250\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_decimal(), dec!(250));

        let fractional: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(fractional.as_decimal(), dec!(12.5));
        assert!(serde_json::from_str::<Price>("-1").is_err());
    }

    #[test]
    fn test_listing_wire_shape() {
        let listing = Listing {
            id: Uuid::from_u128(7),
            title: "Road bike".to_string(),
            description: "54cm frame".to_string(),
            price: Price::new(dec!(300)).unwrap(),
            category: Category::ForSale(Some(ForSaleSubcategory::Sports)),
            region: Region::Oregon,
            coordinate: None,
            listed_at: Utc::now(),
            status: ListingStatus::Active,
        };

        let json = serde_json::to_value(&listing).unwrap();
        assert!(json.get("listedAt").is_some());
        assert!(json.get("listed_at").is_none());
        assert_eq!(json["category"], "ForSale");
        assert_eq!(json["region"], "OR");

        let back: Listing = serde_json::from_value(json).unwrap();
        assert_eq!(back, listing);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(45.0, -75.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_category_from_parts() {
        assert_eq!(
            Category::from_parts("Rental", Some("apartment")).unwrap(),
            Category::Rental(Some(RentalSubcategory::Apartment))
        );
        assert_eq!(
            Category::from_parts("service", None).unwrap(),
            Category::Service(None)
        );
        assert!(matches!(
            Category::from_parts("Job", Some("Apartment")),
            Err(DomainError::UnknownSubcategory { .. })
        ));
        assert!(Category::from_parts("Barter", None).is_err());
    }

    #[test]
    fn test_category_serde_shape() {
        let json = serde_json::to_value(Category::ForSale(Some(ForSaleSubcategory::Books))).unwrap();
        assert_eq!(json["category"], "ForSale");
        assert_eq!(json["subcategory"], "Books");
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("ny".parse::<Region>().unwrap(), Region::NewYork);
        assert_eq!("New Mexico".parse::<Region>().unwrap(), Region::NewMexico);
        assert_eq!(Region::DistrictOfColumbia.code(), "DC");
        assert_eq!(Region::ALL.len(), 51);
        assert!("ZZ".parse::<Region>().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Active".parse::<ListingStatus>().unwrap(), ListingStatus::Active);
        assert_eq!(ListingStatus::Rented.as_str(), "rented");
        assert!("archived".parse::<ListingStatus>().is_err());
    }
}
