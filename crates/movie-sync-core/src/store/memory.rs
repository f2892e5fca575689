//! In-memory [`MovieStore`] implementation for tests.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, which keeps insertion
//! order for [`find_all`](MovieStore::find_all).

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::{Movie, MoviePatch};

use super::{MovieStore, StoreError, StoreResult};

/// In-memory store for tests.
pub struct InMemoryStore {
    movies: RwLock<Vec<Movie>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            movies: RwLock::new(Vec::new()),
        }
    }

    /// Store pre-populated with `movies`, in order.
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self {
            movies: RwLock::new(movies),
        }
    }

    pub fn len(&self) -> usize {
        self.movies.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate_of(existing: &[Movie], movie: &Movie) -> Option<StoreError> {
    if existing.iter().any(|m| m.id == movie.id) {
        return Some(StoreError::Duplicate(format!("id {}", movie.id)));
    }
    if existing.iter().any(|m| m.tmdb_id == movie.tmdb_id) {
        return Some(StoreError::Duplicate(movie.tmdb_id.to_string()));
    }
    None
}

#[async_trait]
impl MovieStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let movies = self.movies.read().unwrap();
        Ok(movies.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_external_ids(&self, tmdb_ids: &[i64]) -> StoreResult<Vec<Movie>> {
        let wanted: HashSet<i64> = tmdb_ids.iter().copied().collect();
        let movies = self.movies.read().unwrap();
        Ok(movies
            .iter()
            .filter(|m| wanted.contains(&m.tmdb_id))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> StoreResult<Vec<Movie>> {
        Ok(self.movies.read().unwrap().clone())
    }

    async fn insert_one(&self, movie: &Movie) -> StoreResult<()> {
        let mut movies = self.movies.write().unwrap();
        if let Some(err) = duplicate_of(&movies, movie) {
            return Err(err);
        }
        movies.push(movie.clone());
        Ok(())
    }

    async fn insert_many(&self, batch: &[Movie]) -> StoreResult<usize> {
        let mut movies = self.movies.write().unwrap();
        // Validate the whole batch (against the store and against itself)
        // before touching anything.
        let mut staged: Vec<Movie> = Vec::with_capacity(batch.len());
        for movie in batch {
            if let Some(err) = duplicate_of(&movies, movie).or_else(|| duplicate_of(&staged, movie))
            {
                return Err(err);
            }
            staged.push(movie.clone());
        }
        let n = staged.len();
        movies.extend(staged);
        Ok(n)
    }

    async fn update_by_id(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>> {
        let mut movies = self.movies.write().unwrap();
        let Some(pos) = movies.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(tmdb_id) = patch.tmdb_id {
            if movies.iter().any(|m| m.id != id && m.tmdb_id == tmdb_id) {
                return Err(StoreError::Duplicate(tmdb_id.to_string()));
            }
        }
        patch.apply(&mut movies[pos]);
        Ok(Some(movies[pos].clone()))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let mut movies = self.movies.write().unwrap();
        Ok(movies
            .iter()
            .position(|m| m.id == id)
            .map(|pos| movies.remove(pos)))
    }
}
