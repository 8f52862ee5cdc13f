//! Database layer for the DOF archive
//!
//! Provides:
//! - SeaORM summary entity and read-only row models
//! - Repository pattern for data access
//! - A shared MySQL connection pool

pub mod models;
mod repository;

pub use repository::{FileDetail, PublicationDetail, Repository, SharedSummary, SummaryUpdate};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Handle to the MySQL pool, cheap to clone into every request
#[derive(Clone)]
pub struct DbPool {
    conn: Arc<DatabaseConnection>,
}

impl DbPool {
    /// Open the pool described by `config`
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!(
            max_connections = config.max_connections,
            "Connecting to MySQL..."
        );

        let mut opts = ConnectOptions::new(config.url.clone());
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(true);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to MySQL: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self::from_connection(conn))
    }

    /// Wrap an already opened connection
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn: Arc::new(conn) }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Take the connection back once every other handle is dropped
    pub fn into_connection(self) -> Option<DatabaseConnection> {
        Arc::try_unwrap(self.conn).ok()
    }

    /// Round-trip a trivial statement
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
