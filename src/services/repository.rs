use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CandidateHint, DomainError, Listing};

/// Errors raised while fetching listings
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid listing row {id}: {source}")]
    InvalidRow {
        id: String,
        #[source]
        source: DomainError,
    },

    #[error("More than {limit} listings match the candidate query")]
    TooManyCandidates { limit: i64 },

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Source of candidate listings
///
/// Implementations may use the hint to narrow what they return, but are not
/// required to. Callers always re-apply their own filtering, so a repository
/// must never drop a listing the hint admits. One that caps its fetch size
/// reports `TooManyCandidates` rather than returning a partial set.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn fetch_candidates(
        &self,
        hint: Option<&CandidateHint>,
    ) -> Result<Vec<Listing>, RepositoryError>;

    /// Get the name of the repository backend
    fn source_name(&self) -> &'static str;
}
