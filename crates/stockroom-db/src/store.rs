//! # Store Traits & Unit of Work
//!
//! The storage contract the services are written against. Both the SQLite
//! transaction scope and the in-memory scope implement every trait here, so
//! the sale workflow is written once and runs over either backend.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionManager::begin()                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Scope: CatalogStore + SaleLedger + AccountStore                       │
//! │       │                                                                 │
//! │       ├── find_item / reduce_stock / insert_sale / insert_line ...     │
//! │       │                                                                 │
//! │       ├── commit()   → every change becomes visible at once            │
//! │       ├── rollback() → nothing happened                                │
//! │       └── drop       → same as rollback (early return, `?`, cancel)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use stockroom_core::{
    ClientInfo, Item, PageRequest, Role, Sale, SaleLine, SaleUpdate, Session, User,
};

use crate::error::DbResult;

/// Outcome of a guarded stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockReduction {
    /// Stock was decremented.
    Reduced,
    /// Stock was left untouched because fewer than the requested units
    /// were on hand.
    Insufficient { available: i64 },
}

/// Items and their stock.
#[async_trait]
pub trait CatalogStore: Send {
    async fn find_item(&mut self, id: &str) -> DbResult<Option<Item>>;

    async fn insert_item(&mut self, item: &Item) -> DbResult<()>;

    /// Decrements stock by `quantity` only if at least `quantity` units are
    /// on hand. A missing item is `DbError::NotFound`.
    async fn reduce_stock(&mut self, id: &str, quantity: i64) -> DbResult<StockReduction>;

    /// Sets an absolute stock level and returns the updated item.
    async fn set_stock(&mut self, id: &str, stock: i64) -> DbResult<Item>;

    /// Sets the selling price and returns the updated item.
    async fn set_price(&mut self, id: &str, price_cents: i64) -> DbResult<Item>;

    /// Active items with `stock <= minimum_stock`, lowest stock first.
    async fn list_low_stock(&mut self, limit: i64) -> DbResult<Vec<Item>>;
}

/// Append-only sale headers and lines.
#[async_trait]
pub trait SaleLedger: Send {
    async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()>;

    async fn insert_line(&mut self, line: &SaleLine) -> DbResult<()>;

    async fn find_sale(&mut self, id: &str) -> DbResult<Option<Sale>>;

    /// Lines of a sale in insertion order.
    async fn sale_lines(&mut self, sale_id: &str) -> DbResult<Vec<SaleLine>>;

    /// One page of sales, newest first, plus the total row count.
    async fn list_sales(&mut self, page: PageRequest) -> DbResult<(Vec<Sale>, i64)>;

    /// Applies the non-`None` fields of `update`. Totals are never touched.
    async fn update_sale_details(&mut self, id: &str, update: &SaleUpdate) -> DbResult<Sale>;
}

/// Users and sessions.
#[async_trait]
pub trait AccountStore: Send {
    async fn insert_user(&mut self, user: &User) -> DbResult<()>;

    async fn find_user(&mut self, id: &str) -> DbResult<Option<User>>;

    /// Looks a user up by username or email.
    async fn find_user_by_identifier(&mut self, identifier: &str) -> DbResult<Option<User>>;

    async fn count_users(&mut self) -> DbResult<i64>;

    async fn set_user_role(&mut self, id: &str, role: Role) -> DbResult<User>;

    async fn set_user_active(&mut self, id: &str, active: bool) -> DbResult<User>;

    async fn insert_session(&mut self, session: &Session) -> DbResult<()>;

    async fn find_session(&mut self, token: &str) -> DbResult<Option<Session>>;

    /// Marks the session revoked. The first revocation time is kept.
    /// Returns whether a session with this token exists.
    async fn revoke_session(&mut self, token: &str, at: DateTime<Utc>) -> DbResult<bool>;

    async fn touch_session(&mut self, token: &str, at: DateTime<Utc>) -> DbResult<()>;

    /// Opens a session for `user_id` with a fresh random token.
    async fn create_session(
        &mut self,
        user_id: &str,
        ttl: Duration,
        client: ClientInfo,
        now: DateTime<Utc>,
    ) -> DbResult<Session> {
        let session = Session::issue(user_id, ttl, client, now);
        self.insert_session(&session).await?;
        Ok(session)
    }
}

/// A transaction scope spanning every store.
#[async_trait]
pub trait UnitOfWork: CatalogStore + SaleLedger + AccountStore + Send {
    /// Makes every change in this scope visible at once.
    async fn commit(self) -> DbResult<()>;

    /// Discards every change in this scope. Dropping the scope does the same.
    async fn rollback(self) -> DbResult<()>;
}

/// Opens units of work.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Scope: UnitOfWork;

    async fn begin(&self) -> DbResult<Self::Scope>;
}
