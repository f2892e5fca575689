//! Movie records as they are stored and exchanged over the API.
//!
//! [`Movie`] is the persisted shape. [`NewMovie`] is the create payload (every
//! field except the local id) and [`MoviePatch`] the partial update payload.
//! Both DTOs carry a `validate` method that enforces the field rules applied to
//! client input; records produced by the catalog sync are trusted and skip it.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A genre attached to a movie, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Normalized movie record held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Local identifier (UUID v4) generated at persistence time.
    pub id: String,
    /// Catalog identifier. Unique across stored records.
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
    /// `YYYY-MM-DD`.
    pub release_date: String,
    pub genres: Vec<Genre>,
}

/// Create payload: a [`Movie`] without its local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
    pub release_date: String,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl NewMovie {
    /// Check client-supplied fields. Returns the first violated rule.
    pub fn validate(&self) -> Result<()> {
        check_tmdb_id(self.tmdb_id)?;
        check_title(&self.title)?;
        check_popularity(self.popularity)?;
        check_vote_average(self.vote_average)?;
        check_vote_count(self.vote_count)?;
        check_release_date(&self.release_date)?;
        check_genres(&self.genres)?;
        Ok(())
    }

    /// Assign a fresh local id and produce the stored shape.
    pub fn into_movie(self) -> Movie {
        Movie {
            id: Uuid::new_v4().to_string(),
            tmdb_id: self.tmdb_id,
            title: self.title,
            overview: self.overview,
            popularity: self.popularity,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            release_date: self.release_date,
            genres: self.genres,
        }
    }
}

/// Partial update payload. Absent fields are left untouched; explicit
/// `null` is refused when decoding request bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatch {
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<Genre>>,
}

impl MoviePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.tmdb_id {
            check_tmdb_id(v)?;
        }
        if let Some(ref v) = self.title {
            check_title(v)?;
        }
        if let Some(v) = self.popularity {
            check_popularity(v)?;
        }
        if let Some(v) = self.vote_average {
            check_vote_average(v)?;
        }
        if let Some(v) = self.vote_count {
            check_vote_count(v)?;
        }
        if let Some(ref v) = self.release_date {
            check_release_date(v)?;
        }
        if let Some(ref v) = self.genres {
            check_genres(v)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == MoviePatch::default()
    }

    /// Overwrite the fields present in the patch. The local id never changes.
    pub fn apply(&self, movie: &mut Movie) {
        if let Some(v) = self.tmdb_id {
            movie.tmdb_id = v;
        }
        if let Some(ref v) = self.title {
            movie.title = v.clone();
        }
        if let Some(ref v) = self.overview {
            movie.overview = v.clone();
        }
        if let Some(v) = self.popularity {
            movie.popularity = v;
        }
        if let Some(v) = self.vote_average {
            movie.vote_average = v;
        }
        if let Some(v) = self.vote_count {
            movie.vote_count = v;
        }
        if let Some(ref v) = self.release_date {
            movie.release_date = v.clone();
        }
        if let Some(ref v) = self.genres {
            movie.genres = v.clone();
        }
    }
}

fn check_tmdb_id(v: i64) -> Result<()> {
    if v <= 0 {
        bail!("tmdbId must be a positive integer");
    }
    Ok(())
}

fn check_title(v: &str) -> Result<()> {
    if v.trim().is_empty() {
        bail!("title must not be empty");
    }
    Ok(())
}

fn check_popularity(v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        bail!("popularity must be a non-negative number");
    }
    Ok(())
}

fn check_vote_average(v: f64) -> Result<()> {
    if !(0.0..=10.0).contains(&v) {
        bail!("voteAverage must be in [0, 10]");
    }
    Ok(())
}

fn check_vote_count(v: i64) -> Result<()> {
    if v < 0 {
        bail!("voteCount must be >= 0");
    }
    Ok(())
}

fn check_release_date(v: &str) -> Result<()> {
    if NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err() {
        bail!("releaseDate must be a date in YYYY-MM-DD format, got '{}'", v);
    }
    Ok(())
}

fn check_genres(genres: &[Genre]) -> Result<()> {
    if genres.iter().any(|g| g.name.trim().is_empty()) {
        bail!("genre names must not be empty");
    }
    Ok(())
}
