use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    CandidateHint, Category, Coordinate, DomainError, Listing, ListingStatus, Price, Region,
    SortOrder,
};
use crate::services::repository::{ListingRepository, RepositoryError};

const SELECT_LISTINGS: &str = r#"
    SELECT id, title, description, price, category, subcategory, region,
           latitude, longitude, listed_at, status
    FROM listings
    WHERE TRUE
"#;

/// PostgreSQL-backed listing repository
///
/// Applies the candidate hint as SQL predicates and orders rows by the
/// hinted sort order. Without one, rows come back newest first, which is the
/// order callers see under `Relevance`.
pub struct PostgresListingRepository {
    pool: PgPool,
    max_candidates: Option<i64>,
}

impl PostgresListingRepository {
    /// Create a new repository from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            max_candidates: None,
        })
    }

    /// Create a new repository from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Cap the number of rows a single candidate fetch may return
    ///
    /// A fetch that would exceed the cap fails with `TooManyCandidates`
    /// instead of returning a partial set.
    pub fn with_max_candidates(mut self, max_candidates: Option<i64>) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Insert or replace a listing
    pub async fn upsert_listing(&self, listing: &Listing) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO listings (id, title, description, price, category, subcategory, region,
                                  latitude, longitude, listed_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id)
            DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                category = EXCLUDED.category,
                subcategory = EXCLUDED.subcategory,
                region = EXCLUDED.region,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                listed_at = EXCLUDED.listed_at,
                status = EXCLUDED.status
        "#;

        sqlx::query(query)
            .bind(listing.id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(listing.price.as_decimal())
            .bind(listing.category.kind().as_str())
            .bind(listing.category.subcategory_name())
            .bind(listing.region.code())
            .bind(listing.coordinate.map(|c| c.latitude()))
            .bind(listing.coordinate.map(|c| c.longitude()))
            .bind(listing.listed_at)
            .bind(listing.status.as_str())
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted listing {}", listing.id);

        Ok(())
    }

    /// Set or clear a listing's coordinate. Returns false if the listing does not exist.
    pub async fn set_coordinate(
        &self,
        id: Uuid,
        coordinate: Option<Coordinate>,
    ) -> Result<bool, RepositoryError> {
        let query = r#"
            UPDATE listings
            SET latitude = $2, longitude = $3
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(id)
            .bind(coordinate.map(|c| c.latitude()))
            .bind(coordinate.map(|c| c.longitude()))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    fn build_query(&self, hint: Option<&CandidateHint>) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(SELECT_LISTINGS);
        let mut sort_order = SortOrder::Relevance;

        if let Some(hint) = hint {
            let criteria = &hint.criteria;
            sort_order = criteria.sort_order;

            if hint.active_only {
                builder
                    .push(" AND status = ")
                    .push_bind(ListingStatus::Active.as_str());
            }

            if !criteria.categories.is_empty() {
                let categories: Vec<String> = criteria
                    .categories
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect();
                builder
                    .push(" AND category = ANY(")
                    .push_bind(categories)
                    .push(")");
            }

            if let Some(region) = criteria.region {
                builder.push(" AND region = ").push_bind(region.code());
            }

            if let Some(min) = criteria.min_price {
                builder.push(" AND price >= ").push_bind(min.as_decimal());
            }

            if let Some(max) = criteria.max_price {
                builder.push(" AND price <= ").push_bind(max.as_decimal());
            }

            if let Some(text) = hint.search_text() {
                let pattern = format!("%{}%", escape_like(text));
                builder
                    .push(" AND (title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }

            if let Some(from) = criteria.date_from {
                builder.push(" AND listed_at >= ").push_bind(from);
            }

            if let Some(to) = criteria.date_to {
                builder.push(" AND listed_at <= ").push_bind(to);
            }

            // Geospatial bounding box pre-filter
            if let Some(bbox) = hint.bounding_box {
                builder
                    .push(" AND latitude BETWEEN ")
                    .push_bind(bbox.min_lat)
                    .push(" AND ")
                    .push_bind(bbox.max_lat)
                    .push(" AND longitude BETWEEN ")
                    .push_bind(bbox.min_lon)
                    .push(" AND ")
                    .push_bind(bbox.max_lon);
            }
        }

        builder.push(order_by(sort_order));

        // One extra row tells a full result apart from a truncated one
        if let Some(limit) = self.max_candidates {
            builder.push(" LIMIT ").push_bind(limit.saturating_add(1));
        }

        builder
    }
}

fn order_by(sort_order: SortOrder) -> &'static str {
    match sort_order {
        SortOrder::Relevance | SortOrder::DateNewest => " ORDER BY listed_at DESC, id",
        SortOrder::DateOldest => " ORDER BY listed_at ASC, id",
        SortOrder::PriceAsc => " ORDER BY price ASC, id",
        SortOrder::PriceDesc => " ORDER BY price DESC, id",
    }
}

/// Escape `LIKE` wildcards so user text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn listing_from_row(row: &PgRow) -> Result<Listing, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let invalid = |source: DomainError| RepositoryError::InvalidRow {
        id: id.to_string(),
        source,
    };

    let price: Decimal = row.try_get("price")?;
    let category: String = row.try_get("category")?;
    let subcategory: Option<String> = row.try_get("subcategory")?;
    let region: String = row.try_get("region")?;
    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;
    let listed_at: DateTime<Utc> = row.try_get("listed_at")?;
    let status: String = row.try_get("status")?;

    Ok(Listing {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: Price::new(price).map_err(invalid)?,
        category: Category::from_parts(&category, subcategory.as_deref()).map_err(invalid)?,
        region: region.parse::<Region>().map_err(invalid)?,
        // Range checks happen when the coordinate is used
        coordinate: latitude
            .zip(longitude)
            .map(|(lat, lon)| Coordinate::new_unchecked(lat, lon)),
        listed_at,
        status: status.parse::<ListingStatus>().map_err(invalid)?,
    })
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    async fn fetch_candidates(
        &self,
        hint: Option<&CandidateHint>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        let mut builder = self.build_query(hint);
        let rows = builder.build().fetch_all(&self.pool).await?;

        if let Some(limit) = self.max_candidates {
            if rows.len() as i64 > limit {
                tracing::warn!("Candidate fetch exceeded the cap of {} rows", limit);
                return Err(RepositoryError::TooManyCandidates { limit });
            }
        }

        let listings = rows
            .iter()
            .map(listing_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} candidate listings", listings.len());

        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "postgres"
    }
}
