//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Service startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Readers run in parallel (WAL).                                        │
//! │  Writers queue on BEGIN IMMEDIATE, waiting up to busy_timeout.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::item::ItemRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/stockroom/stockroom.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// How long a writer waits for the database write lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`. The file is
    /// created if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// A single connection: every connection to `:memory:` is its own
    /// database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(3600),
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access and units of work.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./stockroom.db")).await?;
///
/// // Pool-level catalog access
/// let items = db.items().count().await?;
///
/// // Atomic work
/// let mut scope = db.begin().await?;
/// scope.reduce_stock(&item_id, 3).await?;
/// scope.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous
    ///    - Foreign keys enabled
    ///    - busy_timeout for queued writers
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else {
            SqliteConnectOptions::from_str(&format!(
                "sqlite://{}?mode=rwc",
                config.database_path.display()
            ))
        }
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        // SQLite has foreign keys disabled by default
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout)
        .create_if_missing(true);

        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout));

        if config.is_in_memory() {
            // Recycling the only connection would drop the whole database.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies all pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Whether the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.items().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        assert!(path.exists());
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
