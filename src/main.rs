//! # movie-sync CLI
//!
//! | Command | Description |
//! |---------|-------------|
//! | `movie-sync init` | Create the SQLite database and run schema migrations |
//! | `movie-sync sync` | Run one catalog sync and print the report |
//! | `movie-sync serve` | Start the HTTP server |
//! | `movie-sync list` | Print stored movies |
//! | `movie-sync get <id>` | Print one stored movie |
//!
//! ```bash
//! movie-sync --config ./config/movie-sync.toml init
//! TMDB_API_TOKEN=... movie-sync sync
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use movie_sync::catalog::TmdbClient;
use movie_sync::config::{self, Config};
use movie_sync::sqlite_store::SqliteStore;
use movie_sync::sync::Synchronizer;
use movie_sync::{db, logging, migrate, movies, server};

#[derive(Parser)]
#[command(
    name = "movie-sync",
    about = "Sync top-rated movies from a TMDB-style catalog into SQLite and serve them over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/movie-sync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Fetch candidates from the catalog and store the new ones.
    Sync,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// List stored movies.
    List,

    /// Show a stored movie by its local id.
    Get {
        /// Local movie id (UUID).
        id: String,
    },
}

async fn open_store(cfg: &Config) -> Result<Arc<SqliteStore>> {
    let pool = db::connect(cfg).await?;
    migrate::run_migrations(&pool).await?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(logging::DEFAULT_FILTER)?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Sync => {
            let store = open_store(&cfg).await?;
            let catalog = Arc::new(TmdbClient::new(&cfg.catalog)?);
            let synchronizer = Synchronizer::new(catalog, store.clone());
            let report = synchronizer.synchronize().await?;
            println!("{}", report.message);
            println!("  updated: {}", report.updated_count);
            store.pool().close().await;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::List => {
            let store = open_store(&cfg).await?;
            let all = movies::list_movies(store.as_ref()).await?;
            for m in &all {
                println!(
                    "{}  tmdb:{:<8} {:>4.1}  {}  {}",
                    m.id, m.tmdb_id, m.vote_average, m.release_date, m.title
                );
            }
            println!("{} movies", all.len());
            store.pool().close().await;
        }
        Commands::Get { id } => {
            let store = open_store(&cfg).await?;
            let movie = movies::get_movie(store.as_ref(), &id).await?;
            println!("{}", serde_json::to_string_pretty(&movie)?);
            store.pool().close().await;
        }
    }

    Ok(())
}
