//! Movie CRUD operations shared by the HTTP server and the CLI.
//!
//! Create and update bodies arrive as JSON values, are decoded into
//! [`NewMovie`] / [`MoviePatch`], and validated before touching the store.
//! `tmdbId` uniqueness is enforced by the store for both create and update.

use serde::de::DeserializeOwned;
use serde_json::Value;

use movie_sync_core::models::{Movie, MoviePatch, NewMovie};
use movie_sync_core::store::MovieStore;

use crate::error::{Error, Result};

/// Decode a request body, mapping decode failures to [`Error::Validation`].
///
/// Explicit `null` values are rejected rather than read as absent.
pub fn from_body<T: DeserializeOwned>(body: Value) -> Result<T> {
    let Some(fields) = body.as_object() else {
        return Err(Error::Validation("request body must be a JSON object".to_string()));
    };
    if let Some((key, _)) = fields.iter().find(|(_, v)| v.is_null()) {
        return Err(Error::Validation(format!("field `{}` must not be null", key)));
    }
    serde_json::from_value(body).map_err(|e| Error::Validation(e.to_string()))
}

pub async fn create_movie(store: &dyn MovieStore, input: NewMovie) -> Result<Movie> {
    input
        .validate()
        .map_err(|e| Error::Validation(e.to_string()))?;
    let movie = input.into_movie();
    store.insert_one(&movie).await?;
    tracing::info!(id = %movie.id, tmdb_id = movie.tmdb_id, "movie created");
    Ok(movie)
}

pub async fn list_movies(store: &dyn MovieStore) -> Result<Vec<Movie>> {
    Ok(store.find_all().await?)
}

pub async fn get_movie(store: &dyn MovieStore, id: &str) -> Result<Movie> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(id.to_string()))
}

pub async fn update_movie(store: &dyn MovieStore, id: &str, patch: MoviePatch) -> Result<Movie> {
    if patch.is_empty() {
        return Err(Error::Validation("update body has no fields".to_string()));
    }
    patch
        .validate()
        .map_err(|e| Error::Validation(e.to_string()))?;
    let movie = store
        .update_by_id(id, &patch)
        .await?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    tracing::info!(id = %movie.id, "movie updated");
    Ok(movie)
}

pub async fn delete_movie(store: &dyn MovieStore, id: &str) -> Result<Movie> {
    let movie = store
        .delete_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    tracing::info!(id = %movie.id, "movie deleted");
    Ok(movie)
}
