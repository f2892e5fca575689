//! # movie-sync
//!
//! Pulls top-rated movies from a TMDB-compatible catalog into SQLite and
//! exposes the stored records over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │  Catalog    │──▶│ Synchronizer │──▶│  SQLite  │
//! │ list+detail │   │ dedupe+batch │   │  movies  │
//! └─────────────┘   └──────────────┘   └────┬─────┘
//!                                           │
//!                       ┌───────────────────┤
//!                       ▼                   ▼
//!                 ┌────────────┐      ┌──────────┐
//!                 │    CLI     │      │   HTTP   │
//!                 │(movie-sync)│      │  (Axum)  │
//!                 └────────────┘      └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`catalog`] | Catalog client trait, TMDB client, response validation |
//! | [`sync`] | Fetch → validate → normalize → dedupe → persist |
//! | [`movies`] | CRUD operations over the store |
//! | [`server`] | HTTP server (Axum) |
//! | [`sqlite_store`] | SQLite [`MovieStore`](movie_sync_core::store::MovieStore) |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Schema migrations (idempotent) |
//! | [`error`] | Error taxonomy |
//! | [`logging`] | Tracing subscriber setup |

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod movies;
pub mod server;
pub mod sqlite_store;
pub mod sync;

pub use error::{Error, Result};
pub use movie_sync_core::{models, store};
