//! # Snippetbox DB
//!
//! Postgres connection pool and schema migrations.
//!
//! # Example
//!
//! ```ignore
//! use snippetbox_config::DatabaseConfig;
//! use snippetbox_db::{MIGRATOR, init_db_pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//!     MIGRATOR.run(&pool).await?;
//!     Ok(())
//! }
//! ```

use snippetbox_config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

/// Schema migrations embedded at compile time from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Connects to Postgres and verifies the connection with a round-trip.
///
/// The returned pool is cheaply cloneable and should be shared through the
/// application state rather than reconnected per request.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the server is unreachable.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;
