//! TOML configuration parsing and validation.
//!
//! A single file (default `./config/movie-sync.toml`) drives the database
//! location, the server bind address, and the catalog connection. The catalog
//! section is turned into an explicit [`CatalogConfig`] that is handed to the
//! catalog client at construction; nothing reads the environment later.
//!
//! ```toml
//! [db]
//! path = "./data/movies.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [catalog]
//! base_url = "https://api.themoviedb.org/3"
//! token_env = "TMDB_API_TOKEN"
//!
//! [catalog.discover]
//! min_vote_average = 8.4
//! min_vote_count = 1500
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Connection settings for the external movie catalog.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token given inline. Takes precedence over `token_env`.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub discover: DiscoverFilter,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            discover: DiscoverFilter::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_token_env() -> String {
    "TMDB_API_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Fixed filter applied to the discover call.
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoverFilter {
    #[serde(default = "default_min_vote_average")]
    pub min_vote_average: f64,
    #[serde(default = "default_min_vote_count")]
    pub min_vote_count: i64,
    #[serde(default = "default_watch_providers")]
    pub watch_providers: String,
    #[serde(default = "default_watch_region")]
    pub watch_region: String,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

impl Default for DiscoverFilter {
    fn default() -> Self {
        Self {
            min_vote_average: default_min_vote_average(),
            min_vote_count: default_min_vote_count(),
            watch_providers: default_watch_providers(),
            watch_region: default_watch_region(),
            sort_by: default_sort_by(),
            page: default_page(),
        }
    }
}

fn default_min_vote_average() -> f64 {
    8.4
}
fn default_min_vote_count() -> i64 {
    1500
}
fn default_watch_providers() -> String {
    "8".to_string()
}
fn default_watch_region() -> String {
    "BR".to_string()
}
fn default_sort_by() -> String {
    "primary_release_date.asc".to_string()
}
fn default_page() -> u32 {
    1
}

impl CatalogConfig {
    /// Resolve the bearer token: inline `token` first, then `token_env`.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(ref token) = self.token {
            if !token.trim().is_empty() {
                return Ok(token.clone());
            }
        }
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => bail!(
                "catalog token not configured: set catalog.token or the {} environment variable",
                self.token_env
            ),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    let catalog = &config.catalog;
    if !(catalog.base_url.starts_with("http://") || catalog.base_url.starts_with("https://")) {
        bail!(
            "catalog.base_url must be an http(s) URL, got '{}'",
            catalog.base_url
        );
    }
    if catalog.timeout_secs == 0 {
        bail!("catalog.timeout_secs must be > 0");
    }

    let discover = &catalog.discover;
    if !(0.0..=10.0).contains(&discover.min_vote_average) {
        bail!("catalog.discover.min_vote_average must be in [0.0, 10.0]");
    }
    if discover.min_vote_count < 0 {
        bail!("catalog.discover.min_vote_count must be >= 0");
    }
    if discover.page == 0 {
        bail!("catalog.discover.page must be >= 1");
    }

    Ok(())
}
