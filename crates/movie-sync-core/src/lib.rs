//! # movie-sync core
//!
//! Storage-agnostic pieces of movie-sync: the stored movie shape, the
//! create/update DTOs with their validation rules, and the [`store::MovieStore`]
//! abstraction with an in-memory implementation.
//!
//! This crate has no tokio, sqlx, or HTTP dependencies.

pub mod models;
pub mod store;
