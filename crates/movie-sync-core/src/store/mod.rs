//! Storage abstraction for movie-sync.
//!
//! The [`MovieStore`] trait covers every operation the synchronizer and the
//! CRUD surface need, so the SQLite backend and the in-memory test store are
//! interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes and must
//! keep `tmdb_id` unique: an insert or update that would store a second
//! record with the same catalog id fails with [`StoreError::Duplicate`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Movie, MoviePatch};

/// Errors returned by [`MovieStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would break `tmdb_id` uniqueness.
    #[error("duplicate tmdb_id: {0}")]
    Duplicate(String),

    /// Any other backend failure.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Abstract movie store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_by_id`](MovieStore::find_by_id) | Lookup by local id |
/// | [`find_by_external_ids`](MovieStore::find_by_external_ids) | Records whose `tmdb_id` is in the set |
/// | [`find_all`](MovieStore::find_all) | Every record, insertion order |
/// | [`insert_one`](MovieStore::insert_one) | Insert a single record |
/// | [`insert_many`](MovieStore::insert_many) | All-or-nothing batch insert |
/// | [`update_by_id`](MovieStore::update_by_id) | Apply a partial update |
/// | [`delete_by_id`](MovieStore::delete_by_id) | Physical delete |
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Movie>>;

    async fn find_by_external_ids(&self, tmdb_ids: &[i64]) -> StoreResult<Vec<Movie>>;

    async fn find_all(&self) -> StoreResult<Vec<Movie>>;

    async fn insert_one(&self, movie: &Movie) -> StoreResult<()>;

    /// Insert every record or none of them. Returns the number inserted.
    async fn insert_many(&self, movies: &[Movie]) -> StoreResult<usize>;

    /// Returns the updated record, or `None` when no record has this id.
    async fn update_by_id(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>>;

    /// Returns the removed record, or `None` when no record has this id.
    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Movie>>;
}
