//! Catalog synchronization: fetch → validate → normalize → dedupe → persist.
//!
//! One [`Synchronizer::synchronize`] call runs a linear pipeline:
//!
//! 1. **List** candidates from the catalog.
//! 2. **Details**: fetch every candidate's details concurrently and build a
//!    [`Movie`] with a fresh local id. The gather is fail-fast: the first
//!    failed lookup drops the others and aborts the sync before any write.
//! 3. **Dedupe** against the store by `tmdb_id`.
//! 4. **Persist** the remainder with one `insert_many` (skipped when empty).
//!
//! Upstream validation errors (bad list shape, missing fields, missing
//! details) pass through unchanged. Other catalog failures become
//! [`Error::SyncFailed`] and store failures become
//! [`Error::PersistenceFailure`].
//!
//! An empty candidate list is a successful sync with `updatedCount: 0`.

use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use movie_sync_core::models::{Movie, NewMovie};
use movie_sync_core::store::{MovieStore, StoreError};

use crate::catalog::{CatalogClient, Candidate, MovieDetails};
use crate::error::{Error, Result};

pub const SYNC_MESSAGE: &str = "Database updated successfully";

/// Outcome of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub message: String,
    /// Number of records actually inserted.
    pub updated_count: usize,
}

impl SyncReport {
    fn inserted(n: usize) -> Self {
        Self {
            message: SYNC_MESSAGE.to_string(),
            updated_count: n,
        }
    }
}

pub struct Synchronizer {
    catalog: Arc<dyn CatalogClient>,
    store: Arc<dyn MovieStore>,
}

impl Synchronizer {
    pub fn new(catalog: Arc<dyn CatalogClient>, store: Arc<dyn MovieStore>) -> Self {
        Self { catalog, store }
    }

    pub async fn synchronize(&self) -> Result<SyncReport> {
        let candidates = self
            .catalog
            .list_candidates()
            .await
            .map_err(classify_catalog_error)?;
        tracing::info!(candidates = candidates.len(), "fetched catalog candidates");

        if candidates.is_empty() {
            return Ok(SyncReport::inserted(0));
        }

        let catalog = &self.catalog;
        let lookups = candidates.into_iter().map(|candidate| async move {
            let details = catalog.fetch_details(candidate.id).await?;
            Ok::<Movie, Error>(normalize(candidate, details))
        });
        let movies = try_join_all(lookups)
            .await
            .map_err(classify_catalog_error)?;

        let movies = unique_by_tmdb_id(movies);
        let ids: Vec<i64> = movies.iter().map(|m| m.tmdb_id).collect();
        let existing: HashSet<i64> = self
            .store
            .find_by_external_ids(&ids)
            .await
            .map_err(persistence_failure)?
            .into_iter()
            .map(|m| m.tmdb_id)
            .collect();

        let fresh: Vec<Movie> = movies
            .into_iter()
            .filter(|m| !existing.contains(&m.tmdb_id))
            .collect();

        let inserted = if fresh.is_empty() {
            0
        } else {
            self.store
                .insert_many(&fresh)
                .await
                .map_err(persistence_failure)?
        };

        tracing::info!(
            inserted,
            already_stored = existing.len(),
            "catalog sync complete"
        );
        Ok(SyncReport::inserted(inserted))
    }
}

/// Build the stored shape from a candidate and its details.
fn normalize(candidate: Candidate, details: MovieDetails) -> Movie {
    NewMovie {
        tmdb_id: candidate.id,
        title: candidate.title,
        overview: candidate.overview,
        popularity: candidate.popularity,
        vote_average: candidate.vote_average,
        vote_count: candidate.vote_count,
        release_date: candidate.release_date,
        genres: details.genres,
    }
    .into_movie()
}

/// Keep the first record for each `tmdb_id`, preserving order.
fn unique_by_tmdb_id(movies: Vec<Movie>) -> Vec<Movie> {
    let mut seen = HashSet::new();
    movies
        .into_iter()
        .filter(|m| seen.insert(m.tmdb_id))
        .collect()
}

fn classify_catalog_error(err: Error) -> Error {
    if err.is_upstream_validation() {
        err
    } else {
        tracing::warn!(error = %err, "catalog request failed during sync");
        Error::SyncFailed(err.to_string())
    }
}

fn persistence_failure(err: StoreError) -> Error {
    tracing::error!(error = %err, "store rejected sync");
    Error::PersistenceFailure(err.to_string())
}
