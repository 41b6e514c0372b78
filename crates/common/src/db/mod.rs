//! Storage layer for the catalog
//!
//! Provides:
//! - The `CatalogStore` seam the service commits through
//! - An in-memory store and a PostgreSQL store (SeaORM)
//! - Connection pool management and schema bootstrap

mod memory;
pub mod models;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::StorageConfig;
use crate::domain::{Catalog, ChangeSet};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Schema bootstrap, safe to run on every start
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Where catalog state lives between units of work
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// A consistent snapshot of every entity
    async fn load(&self) -> Result<Catalog>;

    /// Apply all changes of one unit of work, or none of them
    async fn commit(&self, changes: ChangeSet) -> Result<()>;

    /// Readiness check
    async fn ping(&self) -> Result<()>;

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    pub primary: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| AppError::Configuration {
            message: "storage.url is required for the postgres backend".to_string(),
        })?;

        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let primary = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { primary })
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Create missing tables and indexes
    pub async fn migrate(&self) -> Result<()> {
        self.primary.execute_unprepared(SCHEMA_SQL).await?;
        info!("Catalog schema is up to date");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_every_table() {
        for table in [
            "taxonomy_entries",
            "museums",
            "museum_contacts",
            "artworks",
            "artwork_taxonomy",
            "restorers",
            "restorations",
            "restoration_team",
            "loans",
            "loan_artworks",
            "exhibitions",
            "exhibition_artworks",
            "loan_requests",
            "requested_artworks",
        ] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }
}
