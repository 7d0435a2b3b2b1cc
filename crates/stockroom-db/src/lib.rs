//! # stockroom-db: Database Layer for Stockroom
//!
//! Storage for the warehouse backend: SQLite through sqlx, and an
//! in-memory store with the same unit-of-work contract.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  SaleService / AuthService / CatalogService                            │
//! │       │  tm.begin() → scope → commit                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    store      │    │  transaction  │    │    memory    │  │   │
//! │  │   │ CatalogStore  │◄───│  SqliteScope  │    │ MemoryScope  │  │   │
//! │  │   │ SaleLedger    │    │ (BEGIN IMMED.)│    │ (staged copy)│  │   │
//! │  │   │ AccountStore  │    └───────┬───────┘    └──────────────┘  │   │
//! │  │   │ UnitOfWork    │            │                               │   │
//! │  │   └───────────────┘    ┌───────▼───────┐    ┌──────────────┐  │   │
//! │  │                        │  repository   │    │  migrations  │  │   │
//! │  │                        │ item, sale,   │    │ 001_initial  │  │   │
//! │  │                        │ user, session │    │  (embedded)  │  │   │
//! │  │                        └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL per table
//! - [`store`] - Store traits and the unit-of-work contract
//! - [`transaction`] - SQLite unit of work
//! - [`memory`] - In-memory unit of work
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig, TransactionManager, UnitOfWork, CatalogStore};
//!
//! let db = Database::new(DbConfig::new("./stockroom.db")).await?;
//!
//! let mut scope = db.begin().await?;
//! scope.reduce_stock(&item_id, 3).await?;
//! scope.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;
pub mod transaction;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use memory::{MemoryScope, MemoryStore};
pub use pool::{Database, DbConfig};
pub use store::{
    AccountStore, CatalogStore, SaleLedger, StockReduction, TransactionManager, UnitOfWork,
};
pub use transaction::SqliteScope;

pub use repository::item::ItemRepository;
