//! # Database Migrations
//!
//! Embedded SQL migrations for Stockroom.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (create if missing)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record each checksum                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = test_db().await;
        run_migrations(db.pool()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }
}
