//! # SQLite Unit of Work
//!
//! [`SqliteScope`] wraps one sqlx transaction opened with
//! `BEGIN IMMEDIATE`.
//!
//! ## Why IMMEDIATE
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Deferred BEGIN (sqlx default):                                        │
//! │    T1 reads stock=5          T2 reads stock=5                          │
//! │    T1 writes  ──► commits     T2 writes ──► SQLITE_BUSY_SNAPSHOT       │
//! │                                                                         │
//! │  BEGIN IMMEDIATE:                                                      │
//! │    T1 takes the write lock   T2 waits (busy_timeout)                   │
//! │    T1 commits                T2 starts, reads stock=0                  │
//! │                              T2 → InsufficientStock                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a scope without calling `commit` rolls the transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{item, sale, session, user};
use crate::store::{
    AccountStore, CatalogStore, SaleLedger, StockReduction, TransactionManager, UnitOfWork,
};
use stockroom_core::{Item, PageRequest, Role, Sale, SaleLine, SaleUpdate, Session, User};

/// One open SQLite write transaction.
pub struct SqliteScope {
    tx: Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for SqliteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteScope").finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionManager for Database {
    type Scope = SqliteScope;

    async fn begin(&self) -> DbResult<SqliteScope> {
        let tx = self
            .pool()
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::PoolExhausted => DbError::PoolExhausted,
                other => DbError::transaction(other),
            })?;
        debug!("Transaction started");
        Ok(SqliteScope { tx })
    }
}

#[async_trait]
impl UnitOfWork for SqliteScope {
    async fn commit(self) -> DbResult<()> {
        self.tx.commit().await.map_err(DbError::transaction)?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await.map_err(DbError::transaction)?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteScope {
    async fn find_item(&mut self, id: &str) -> DbResult<Option<Item>> {
        item::find_by_id(&mut self.tx, id).await
    }

    async fn insert_item(&mut self, new_item: &Item) -> DbResult<()> {
        item::insert(&mut self.tx, new_item).await
    }

    async fn reduce_stock(&mut self, id: &str, quantity: i64) -> DbResult<StockReduction> {
        item::reduce_stock(&mut self.tx, id, quantity).await
    }

    async fn set_stock(&mut self, id: &str, stock: i64) -> DbResult<Item> {
        item::set_stock(&mut self.tx, id, stock).await
    }

    async fn set_price(&mut self, id: &str, price_cents: i64) -> DbResult<Item> {
        item::set_price(&mut self.tx, id, price_cents).await
    }

    async fn list_low_stock(&mut self, limit: i64) -> DbResult<Vec<Item>> {
        item::list_low_stock(&mut self.tx, limit).await
    }
}

#[async_trait]
impl SaleLedger for SqliteScope {
    async fn insert_sale(&mut self, new_sale: &Sale) -> DbResult<()> {
        sale::insert_sale(&mut self.tx, new_sale).await
    }

    async fn insert_line(&mut self, line: &SaleLine) -> DbResult<()> {
        sale::insert_line(&mut self.tx, line).await
    }

    async fn find_sale(&mut self, id: &str) -> DbResult<Option<Sale>> {
        sale::find_by_id(&mut self.tx, id).await
    }

    async fn sale_lines(&mut self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        sale::lines(&mut self.tx, sale_id).await
    }

    async fn list_sales(&mut self, page: PageRequest) -> DbResult<(Vec<Sale>, i64)> {
        sale::list(&mut self.tx, page).await
    }

    async fn update_sale_details(&mut self, id: &str, update: &SaleUpdate) -> DbResult<Sale> {
        sale::update_details(&mut self.tx, id, update).await
    }
}

#[async_trait]
impl AccountStore for SqliteScope {
    async fn insert_user(&mut self, new_user: &User) -> DbResult<()> {
        user::insert(&mut self.tx, new_user).await
    }

    async fn find_user(&mut self, id: &str) -> DbResult<Option<User>> {
        user::find_by_id(&mut self.tx, id).await
    }

    async fn find_user_by_identifier(&mut self, identifier: &str) -> DbResult<Option<User>> {
        user::find_by_identifier(&mut self.tx, identifier).await
    }

    async fn count_users(&mut self) -> DbResult<i64> {
        user::count(&mut self.tx).await
    }

    async fn set_user_role(&mut self, id: &str, role: Role) -> DbResult<User> {
        user::set_role(&mut self.tx, id, role).await
    }

    async fn set_user_active(&mut self, id: &str, active: bool) -> DbResult<User> {
        user::set_active(&mut self.tx, id, active).await
    }

    async fn insert_session(&mut self, new_session: &Session) -> DbResult<()> {
        session::insert(&mut self.tx, new_session).await
    }

    async fn find_session(&mut self, token: &str) -> DbResult<Option<Session>> {
        session::find_by_token(&mut self.tx, token).await
    }

    async fn revoke_session(&mut self, token: &str, at: DateTime<Utc>) -> DbResult<bool> {
        session::revoke(&mut self.tx, token, at).await
    }

    async fn touch_session(&mut self, token: &str, at: DateTime<Utc>) -> DbResult<()> {
        session::touch(&mut self.tx, token, at).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_item, test_db};

    async fn stored(db: &Database, id: &str) -> Option<Item> {
        let mut conn = db.pool().acquire().await.unwrap();
        item::find_by_id(&mut conn, id).await.unwrap()
    }

    #[tokio::test]
    async fn test_commit_makes_changes_visible() {
        let db = test_db().await;
        let it = sample_item("BOLT-M8", 100, 10);
        db.items().insert(&it).await.unwrap();

        let mut scope = db.begin().await.unwrap();
        assert_eq!(scope.reduce_stock(&it.id, 4).await.unwrap(), StockReduction::Reduced);
        scope.commit().await.unwrap();

        let stored = stored(&db, &it.id).await.unwrap();
        assert_eq!(stored.stock, 6);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = test_db().await;
        let it = sample_item("BOLT-M8", 100, 10);
        db.items().insert(&it).await.unwrap();

        {
            let mut scope = db.begin().await.unwrap();
            scope.reduce_stock(&it.id, 4).await.unwrap();
            let inside = scope.find_item(&it.id).await.unwrap().unwrap();
            assert_eq!(inside.stock, 6);
        }

        let stored = stored(&db, &it.id).await.unwrap();
        assert_eq!(stored.stock, 10);
    }

    #[tokio::test]
    async fn test_explicit_rollback() {
        let db = test_db().await;
        let it = sample_item("BOLT-M8", 100, 10);

        let mut scope = db.begin().await.unwrap();
        scope.insert_item(&it).await.unwrap();
        scope.rollback().await.unwrap();

        assert!(stored(&db, &it.id).await.is_none());
    }
}
