//! Data access layer.
//!
//! # Modules
//!
//! - [`handlers`]: Store traits and their PostgreSQL implementations
//! - [`models`]: Records and request types shared by all stores
//! - [`in_memory`]: Process-local store behind the same traits
//! - [`errors`]: Storage error classification

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::config::PoolSettings;

/// Get the carvault database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open a connection pool and bring the schema up to date.
pub async fn connect(url: &str, settings: &PoolSettings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout((settings.idle_timeout_secs > 0).then(|| Duration::from_secs(settings.idle_timeout_secs)))
        .max_lifetime((settings.max_lifetime_secs > 0).then(|| Duration::from_secs(settings.max_lifetime_secs)))
        .connect(url)
        .await?;

    info!("Running database migrations...");
    migrator().run(&pool).await?;

    Ok(pool)
}
