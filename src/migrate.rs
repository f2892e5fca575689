use anyhow::Result;
use sqlx::SqlitePool;

/// Create the `movies` table and its indexes. Safe to run repeatedly.
///
/// `tmdb_id` carries a `UNIQUE` constraint: it is the single uniqueness
/// policy shared by the sync path and direct creates.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id TEXT PRIMARY KEY,
            tmdb_id INTEGER NOT NULL UNIQUE,
            title TEXT NOT NULL,
            overview TEXT NOT NULL,
            popularity REAL NOT NULL,
            vote_average REAL NOT NULL,
            vote_count INTEGER NOT NULL,
            release_date TEXT NOT NULL,
            genres_json TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_release_date ON movies(release_date)")
        .execute(pool)
        .await?;

    Ok(())
}
