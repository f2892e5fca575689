//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/retrieve` | Run a catalog sync, return `{message, updatedCount}` |
//! | `POST` | `/movies` | Create a movie (201) |
//! | `GET`  | `/movies` | List stored movies |
//! | `GET`  | `/movies/{id}` | Fetch one movie by local id |
//! | `PUT`/`PATCH` | `/movies/{id}` | Partial update |
//! | `DELETE` | `/movies/{id}` | Delete, returning the removed movie |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "movie not found: 3f2a..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `bad_upstream_data` (400),
//! `not_found` (404), `conflict` (409), `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use movie_sync_core::models::{Movie, MoviePatch, NewMovie};
use movie_sync_core::store::MovieStore;

use crate::catalog::TmdbClient;
use crate::config::Config;
use crate::error::Error;
use crate::movies;
use crate::sqlite_store::SqliteStore;
use crate::sync::{SyncReport, Synchronizer};
use crate::{db, migrate};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MovieStore>,
    pub synchronizer: Arc<Synchronizer>,
}

impl AppState {
    pub fn new(store: Arc<dyn MovieStore>, synchronizer: Arc<Synchronizer>) -> Self {
        Self {
            store,
            synchronizer,
        }
    }
}

/// Build the router for the given state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/retrieve", get(handle_retrieve))
        .route("/movies", get(handle_list).post(handle_create))
        .route(
            "/movies/{id}",
            get(handle_get)
                .put(handle_update)
                .patch(handle_update)
                .delete(handle_delete),
        )
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already-bound listener until the process is terminated.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Starts the HTTP server.
///
/// Connects to SQLite, runs migrations, builds the catalog client from
/// `[catalog]`, and binds to `[server].bind`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    let store: Arc<dyn MovieStore> = Arc::new(SqliteStore::new(pool));
    let catalog = Arc::new(TmdbClient::new(&config.catalog)?);
    let synchronizer = Arc::new(Synchronizer::new(catalog, store.clone()));

    let listener = TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "movie-sync server listening");

    serve(listener, AppState::new(store, synchronizer)).await
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::InvalidUpstreamFormat(_) | Error::MissingRequiredFields { .. } => {
                (StatusCode::BAD_REQUEST, "bad_upstream_data")
            }
            Error::DetailsNotFound(_) | Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Error::SyncFailed(_)
            | Error::PersistenceFailure(_)
            | Error::Upstream { .. }
            | Error::Http(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

/// Malformed JSON, a missing `Content-Type`, or an unreadable body all
/// surface as `bad_request` in the usual error envelope.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: rejection.body_text(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /retrieve ============

async fn handle_retrieve(State(state): State<AppState>) -> Result<Json<SyncReport>, AppError> {
    let report = state.synchronizer.synchronize().await?;
    Ok(Json(report))
}

// ============ /movies ============

async fn handle_create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Movie>), AppError> {
    let Json(body) = body?;
    let input: NewMovie = movies::from_body(body)?;
    let movie = movies::create_movie(state.store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, AppError> {
    Ok(Json(movies::list_movies(state.store.as_ref()).await?))
}

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(movies::get_movie(state.store.as_ref(), &id).await?))
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Movie>, AppError> {
    let Json(body) = body?;
    let patch: MoviePatch = movies::from_body(body)?;
    Ok(Json(
        movies::update_movie(state.store.as_ref(), &id, patch).await?,
    ))
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(movies::delete_movie(state.store.as_ref(), &id).await?))
}
