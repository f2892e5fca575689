//! SQLite-backed [`MovieStore`] implementation.
//!
//! Genres are stored as a JSON array in `genres_json`. `tmdb_id` uniqueness
//! comes from the table's `UNIQUE` constraint (see [`crate::migrate`]);
//! constraint violations surface as [`StoreError::Duplicate`].

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use movie_sync_core::models::{Genre, Movie, MoviePatch};
use movie_sync_core::store::{MovieStore, StoreError, StoreResult};

const COLUMNS: &str =
    "id, tmdb_id, title, overview, popularity, vote_average, vote_count, release_date, genres_json";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(db.message().to_string());
        }
    }
    StoreError::Backend(err.into())
}

fn row_to_movie(row: &SqliteRow) -> StoreResult<Movie> {
    let genres_json: String = row.try_get("genres_json").map_err(db_err)?;
    let genres: Vec<Genre> = serde_json::from_str(&genres_json)
        .map_err(|e| StoreError::Backend(anyhow::anyhow!("corrupt genres_json: {}", e)))?;

    Ok(Movie {
        id: row.try_get("id").map_err(db_err)?,
        tmdb_id: row.try_get("tmdb_id").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        overview: row.try_get("overview").map_err(db_err)?,
        popularity: row.try_get("popularity").map_err(db_err)?,
        vote_average: row.try_get("vote_average").map_err(db_err)?,
        vote_count: row.try_get("vote_count").map_err(db_err)?,
        release_date: row.try_get("release_date").map_err(db_err)?,
        genres,
    })
}

fn genres_to_json(genres: &[Genre]) -> StoreResult<String> {
    serde_json::to_string(genres).map_err(|e| StoreError::Backend(e.into()))
}

async fn insert_movie<'e, E>(executor: E, movie: &Movie, created_at: i64) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO movies (id, tmdb_id, title, overview, popularity, vote_average,
                            vote_count, release_date, genres_json, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movie.id)
    .bind(movie.tmdb_id)
    .bind(&movie.title)
    .bind(&movie.overview)
    .bind(movie.popularity)
    .bind(movie.vote_average)
    .bind(movie.vote_count)
    .bind(&movie.release_date)
    .bind(genres_to_json(&movie.genres)?)
    .bind(created_at)
    .execute(executor)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl MovieStore for SqliteStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let row = sqlx::query(&format!("SELECT {} FROM movies WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_movie).transpose()
    }

    async fn find_by_external_ids(&self, tmdb_ids: &[i64]) -> StoreResult<Vec<Movie>> {
        if tmdb_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids_json = serde_json::to_string(tmdb_ids).map_err(|e| StoreError::Backend(e.into()))?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM movies WHERE tmdb_id IN (SELECT value FROM json_each(?))",
            COLUMNS
        ))
        .bind(ids_json)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_movie).collect()
    }

    async fn find_all(&self) -> StoreResult<Vec<Movie>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM movies ORDER BY created_at ASC, rowid ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_movie).collect()
    }

    async fn insert_one(&self, movie: &Movie) -> StoreResult<()> {
        let now = chrono::Utc::now().timestamp_millis();
        insert_movie(&self.pool, movie, now).await
    }

    async fn insert_many(&self, movies: &[Movie]) -> StoreResult<usize> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for movie in movies {
            insert_movie(&mut *tx, movie, now).await?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(movies.len())
    }

    async fn update_by_id(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query(&format!("SELECT {} FROM movies WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        let mut movie = match row {
            Some(ref row) => row_to_movie(row)?,
            None => return Ok(None),
        };
        patch.apply(&mut movie);

        sqlx::query(
            r#"
            UPDATE movies SET
                tmdb_id = ?, title = ?, overview = ?, popularity = ?, vote_average = ?,
                vote_count = ?, release_date = ?, genres_json = ?
            WHERE id = ?
            "#,
        )
        .bind(movie.tmdb_id)
        .bind(&movie.title)
        .bind(&movie.overview)
        .bind(movie.popularity)
        .bind(movie.vote_average)
        .bind(movie.vote_count)
        .bind(&movie.release_date)
        .bind(genres_to_json(&movie.genres)?)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(movie))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let row = sqlx::query(&format!(
            "DELETE FROM movies WHERE id = ? RETURNING {}",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_movie).transpose()
    }
}
