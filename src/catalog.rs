//! External movie catalog access: candidate listing, detail lookup, and
//! validation of what the catalog returns.
//!
//! The [`CatalogClient`] trait is the seam the synchronizer depends on.
//! [`TmdbClient`] implements it against a TMDB-compatible HTTP API:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | [`list_candidates`](CatalogClient::list_candidates) | `GET {base_url}/discover/movie` |
//! | [`fetch_details`](CatalogClient::fetch_details) | `GET {base_url}/movie/{id}` |
//!
//! # Validation
//!
//! Responses are deserialized into raw structs where every field is optional,
//! then checked against a per-schema list of `(field, predicate)` pairs. A
//! field passes when it is present, whatever its value: `0` and `""` are
//! accepted, JSON `null` is treated as absent. One bad candidate rejects the
//! whole list.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use movie_sync_core::models::Genre;

use crate::config::{CatalogConfig, DiscoverFilter};
use crate::error::{Error, Result};

/// A validated catalog candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
    pub release_date: String,
}

/// Validated per-movie details.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
    pub genres: Vec<Genre>,
}

/// Source of candidate movies and their details.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of candidates matching the configured filter.
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;

    /// Fetch extended details for one catalog id.
    async fn fetch_details(&self, tmdb_id: i64) -> Result<MovieDetails>;
}

// ============ Validation ============

/// Candidate as it arrives from the discover endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RawCandidate {
    pub id: Option<i64>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub release_date: Option<String>,
}

/// Details as they arrive from the movie endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RawDetails {
    pub genres: Option<Vec<Genre>>,
}

type FieldCheck<T> = (&'static str, fn(&T) -> bool);

// `id` is not part of the displayed record but is the dedupe key, so it is
// required as well.
const CANDIDATE_FIELDS: &[FieldCheck<RawCandidate>] = &[
    ("id", |c: &RawCandidate| c.id.is_some()),
    ("original_title", |c: &RawCandidate| c.original_title.is_some()),
    ("overview", |c: &RawCandidate| c.overview.is_some()),
    ("popularity", |c: &RawCandidate| c.popularity.is_some()),
    ("vote_average", |c: &RawCandidate| c.vote_average.is_some()),
    ("vote_count", |c: &RawCandidate| c.vote_count.is_some()),
    ("release_date", |c: &RawCandidate| c.release_date.is_some()),
];

const DETAIL_FIELDS: &[FieldCheck<RawDetails>] = &[("genres", |d: &RawDetails| d.genres.is_some())];

/// Names of the fields whose predicate fails.
fn missing_fields<T>(record: &T, checks: &[FieldCheck<T>]) -> Vec<&'static str> {
    checks
        .iter()
        .filter(|(_, present)| !present(record))
        .map(|(name, _)| *name)
        .collect()
}

impl RawCandidate {
    /// Promote to a [`Candidate`], or report every missing field.
    pub fn validate(self, label: &str) -> Result<Candidate> {
        let missing = missing_fields(&self, CANDIDATE_FIELDS);
        match self {
            RawCandidate {
                id: Some(id),
                original_title: Some(title),
                overview: Some(overview),
                popularity: Some(popularity),
                vote_average: Some(vote_average),
                vote_count: Some(vote_count),
                release_date: Some(release_date),
            } => Ok(Candidate {
                id,
                title,
                overview,
                popularity,
                vote_average,
                vote_count,
                release_date,
            }),
            _ => Err(Error::missing_fields(label, missing)),
        }
    }
}

impl RawDetails {
    pub fn validate(self, tmdb_id: i64) -> Result<MovieDetails> {
        let missing = missing_fields(&self, DETAIL_FIELDS);
        match self.genres {
            Some(genres) => Ok(MovieDetails { genres }),
            None => Err(Error::missing_fields(
                format!("details for movie {}", tmdb_id),
                missing,
            )),
        }
    }
}

/// Parse and validate a discover response body.
///
/// The body must be an object with a `results` array. An empty array is a
/// valid, empty page.
pub fn parse_candidates(body: &str) -> Result<Vec<Candidate>> {
    if body.trim().is_empty() {
        return Err(Error::InvalidUpstreamFormat(
            "empty list response".to_string(),
        ));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::InvalidUpstreamFormat(format!("list response is not JSON: {}", e)))?;

    let results = match value.get("results") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(Error::InvalidUpstreamFormat(format!(
                "results is not an array (got {})",
                json_kind(other)
            )))
        }
        None => {
            return Err(Error::InvalidUpstreamFormat(
                "list response has no results".to_string(),
            ))
        }
    };

    let mut raw = Vec::with_capacity(results.len());
    for (i, item) in results.iter().enumerate() {
        let parsed: RawCandidate = serde_json::from_value(item.clone()).map_err(|e| {
            Error::InvalidUpstreamFormat(format!("candidate #{} is malformed: {}", i, e))
        })?;
        raw.push(parsed);
    }

    raw.into_iter()
        .enumerate()
        .map(|(i, c)| {
            let label = match c.id {
                Some(id) => format!("candidate #{} (id {})", i, id),
                None => format!("candidate #{}", i),
            };
            c.validate(&label)
        })
        .collect()
}

/// Parse and validate a movie details response body.
pub fn parse_details(tmdb_id: i64, body: &str) -> Result<MovieDetails> {
    if body.trim().is_empty() {
        return Err(Error::DetailsNotFound(tmdb_id));
    }
    let value: Value = serde_json::from_str(body).map_err(|e| {
        Error::InvalidUpstreamFormat(format!("details for movie {} are not JSON: {}", tmdb_id, e))
    })?;
    if value.is_null() {
        return Err(Error::DetailsNotFound(tmdb_id));
    }
    if !value.is_object() {
        return Err(Error::InvalidUpstreamFormat(format!(
            "details for movie {} are not an object (got {})",
            tmdb_id,
            json_kind(&value)
        )));
    }
    let raw: RawDetails = serde_json::from_value(value).map_err(|e| {
        Error::InvalidUpstreamFormat(format!("details for movie {} are malformed: {}", tmdb_id, e))
    })?;
    raw.validate(tmdb_id)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============ TMDB client ============

/// [`CatalogClient`] backed by a TMDB-compatible HTTP API.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    filter: DiscoverFilter,
}

impl TmdbClient {
    /// Build a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no bearer token can be resolved or the HTTP
    /// client cannot be built.
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let token = config.resolve_token()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            filter: config.discover.clone(),
        })
    }

    fn discover_query(&self) -> Vec<(&'static str, String)> {
        let f = &self.filter;
        vec![
            ("vote_average.gte", f.min_vote_average.to_string()),
            ("vote_count.gte", f.min_vote_count.to_string()),
            ("with_watch_providers", f.watch_providers.clone()),
            ("watch_region", f.watch_region.clone()),
            ("sort_by", f.sort_by.clone()),
            ("page", f.page.to_string()),
        ]
    }

    async fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

fn upstream_error(status: StatusCode, body: &str) -> Error {
    Error::Upstream {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    }
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let (status, body) = self.get("/discover/movie", &self.discover_query()).await?;
        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }
        let candidates = parse_candidates(&body)?;
        tracing::debug!(count = candidates.len(), "catalog returned candidates");
        Ok(candidates)
    }

    async fn fetch_details(&self, tmdb_id: i64) -> Result<MovieDetails> {
        let (status, body) = self.get(&format!("/movie/{}", tmdb_id), &[]).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(Error::DetailsNotFound(tmdb_id));
        }
        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }
        parse_details(tmdb_id, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"{"page":1,"results":[{"id":1,"original_title":"X","overview":"Y","popularity":10,"vote_average":9,"vote_count":2000,"release_date":"2020-01-01"}]}"#;

    #[test]
    fn test_parse_valid_candidate() {
        let candidates = parse_candidates(ONE).unwrap();
        assert_eq!(
            candidates,
            vec![Candidate {
                id: 1,
                title: "X".to_string(),
                overview: "Y".to_string(),
                popularity: 10.0,
                vote_average: 9.0,
                vote_count: 2000,
                release_date: "2020-01-01".to_string(),
            }]
        );
    }

    #[test]
    fn test_zero_and_empty_values_pass() {
        let body = r#"{"results":[{"id":5,"original_title":"","overview":"","popularity":0,"vote_average":0,"vote_count":0,"release_date":""}]}"#;
        let candidates = parse_candidates(body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "");
        assert_eq!(candidates[0].vote_count, 0);
    }

    #[test]
    fn test_empty_results_is_valid() {
        assert!(parse_candidates(r#"{"results":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_non_array_results_is_invalid_format() {
        for body in [
            r#"{"results":{"id":1}}"#,
            r#"{"results":"nope"}"#,
            r#"{"results":null}"#,
            r#"{"page":1}"#,
            r#"[]"#,
            "null",
            "",
            "   ",
            "<html>",
        ] {
            let err = parse_candidates(body).unwrap_err();
            assert!(
                matches!(err, Error::InvalidUpstreamFormat(_)),
                "body {:?} gave {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn test_one_bad_candidate_rejects_batch() {
        let body = r#"{"results":[
            {"id":1,"original_title":"A","overview":"a","popularity":1,"vote_average":9,"vote_count":2000,"release_date":"2020-01-01"},
            {"id":2,"original_title":"B","popularity":1,"vote_average":9,"release_date":"2020-01-01"}
        ]}"#;
        match parse_candidates(body).unwrap_err() {
            Error::MissingRequiredFields { record, fields } => {
                assert!(record.contains("id 2"));
                assert_eq!(fields, vec!["overview", "vote_count"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let body = r#"{"results":[{"id":1,"original_title":null,"overview":"Y","popularity":10,"vote_average":9,"vote_count":2000,"release_date":"2020-01-01"}]}"#;
        assert!(matches!(
            parse_candidates(body).unwrap_err(),
            Error::MissingRequiredFields { .. }
        ));
    }

    #[test]
    fn test_each_required_field_is_checked() {
        let full: Value = serde_json::from_str(ONE).unwrap();
        let template = full["results"][0].as_object().unwrap().clone();
        for (field, _) in CANDIDATE_FIELDS {
            let mut item = template.clone();
            item.remove(*field);
            let body = serde_json::json!({ "results": [item] }).to_string();
            match parse_candidates(&body).unwrap_err() {
                Error::MissingRequiredFields { fields, .. } => assert_eq!(fields, vec![*field]),
                other => panic!("{} removed, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_wrongly_typed_field_is_invalid_format() {
        let body = r#"{"results":[{"id":"one","original_title":"X","overview":"Y","popularity":10,"vote_average":9,"vote_count":2000,"release_date":"2020-01-01"}]}"#;
        assert!(matches!(
            parse_candidates(body).unwrap_err(),
            Error::InvalidUpstreamFormat(_)
        ));
    }

    #[test]
    fn test_parse_details() {
        let details = parse_details(1, r#"{"id":1,"genres":[{"id":1,"name":"Drama"}]}"#).unwrap();
        assert_eq!(
            details.genres,
            vec![Genre {
                id: 1,
                name: "Drama".to_string()
            }]
        );
        assert!(parse_details(1, r#"{"genres":[]}"#).unwrap().genres.is_empty());
    }

    #[test]
    fn test_details_without_genres() {
        match parse_details(9, r#"{"id":9,"title":"X"}"#).unwrap_err() {
            Error::MissingRequiredFields { fields, .. } => assert_eq!(fields, vec!["genres"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_absent_details() {
        assert!(matches!(parse_details(9, "").unwrap_err(), Error::DetailsNotFound(9)));
        assert!(matches!(parse_details(9, "null").unwrap_err(), Error::DetailsNotFound(9)));
    }

    #[test]
    fn test_discover_query_uses_filter() {
        let config = CatalogConfig {
            token: Some("t".to_string()),
            ..Default::default()
        };
        let client = TmdbClient::new(&config).unwrap();
        let query = client.discover_query();
        assert!(query.contains(&("vote_average.gte", "8.4".to_string())));
        assert!(query.contains(&("vote_count.gte", "1500".to_string())));
        assert!(query.contains(&("sort_by", "primary_release_date.asc".to_string())));
        assert!(query.contains(&("page", "1".to_string())));
    }
}
