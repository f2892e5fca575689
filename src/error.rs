//! Error types for catalog fetching, synchronization, and movie CRUD.

use movie_sync_core::store::StoreError;
use thiserror::Error;

/// Result type alias for movie-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The catalog list response is not shaped like `{ "results": [...] }`.
    #[error("invalid upstream format: {0}")]
    InvalidUpstreamFormat(String),

    /// A catalog record lacks one or more required fields.
    #[error("missing required fields on {record}: {}", .fields.join(", "))]
    MissingRequiredFields {
        record: String,
        fields: Vec<&'static str>,
    },

    /// The catalog has no details for this movie.
    #[error("details not found for movie {0}")]
    DetailsNotFound(i64),

    /// Unexpected failure while talking to the catalog during a sync.
    #[error("sync failed: {0}")]
    SyncFailed(String),

    /// The store rejected a read or write during a sync.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// No stored movie has this local id.
    #[error("movie not found: {0}")]
    NotFound(String),

    /// Malformed create/update body.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The write would duplicate an existing `tmdbId`.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Non-success status from the catalog.
    #[error("catalog error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Transport-level failure talking to the catalog.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn missing_fields(record: impl Into<String>, fields: Vec<&'static str>) -> Self {
        Self::MissingRequiredFields {
            record: record.into(),
            fields,
        }
    }

    /// Errors caused by bad upstream data rather than by this service.
    ///
    /// The synchronizer passes these through unchanged so callers can tell
    /// them apart from internal failures.
    pub fn is_upstream_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidUpstreamFormat(_)
                | Self::MissingRequiredFields { .. }
                | Self::DetailsNotFound(_)
        )
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => Self::Conflict(format!("tmdbId already stored: {}", what)),
            StoreError::Backend(e) => Self::PersistenceFailure(format!("{:#}", e)),
        }
    }
}
