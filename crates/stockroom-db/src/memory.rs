//! # In-Memory Store
//!
//! A [`TransactionManager`] over plain vectors, with the same contract as
//! the SQLite scope: unique keys, foreign keys, the guarded decrement, and
//! all-or-nothing commits.
//!
//! ## Isolation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin()  → lock the shared state (one scope at a time)                │
//! │             clone it into `staged`                                     │
//! │                                                                         │
//! │  work     → every read and write goes to `staged`                      │
//! │                                                                         │
//! │  commit() → write `staged` back, release the lock                      │
//! │  drop     → discard `staged`, release the lock                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{DbError, DbResult};
use crate::store::{
    AccountStore, CatalogStore, SaleLedger, StockReduction, TransactionManager, UnitOfWork,
};
use stockroom_core::{Item, PageRequest, Role, Sale, SaleLine, SaleUpdate, Session, User};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: Vec<Item>,
    sales: Vec<Sale>,
    lines: Vec<SaleLine>,
    users: Vec<User>,
    sessions: Vec<Session>,
}

/// Shared in-memory database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_commits: Arc<AtomicBool>,
    sold_out_on_reduce: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `commit` fail with `TransactionFailed` (for
    /// exercising commit-failure paths).
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Makes every later guarded decrement report the item sold out, as if
    /// another writer took the units after the caller checked stock.
    pub fn sell_out_on_reduce(&self, enabled: bool) {
        self.sold_out_on_reduce.store(enabled, Ordering::SeqCst);
    }

    /// Committed items, in insertion order.
    pub async fn items(&self) -> Vec<Item> {
        self.state.lock().await.items.clone()
    }

    /// Committed sales, in insertion order.
    pub async fn sales(&self) -> Vec<Sale> {
        self.state.lock().await.sales.clone()
    }

    /// Committed sale lines, in insertion order.
    pub async fn sale_lines(&self) -> Vec<SaleLine> {
        self.state.lock().await.lines.clone()
    }

    pub async fn item(&self, id: &str) -> Option<Item> {
        self.state
            .lock()
            .await
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }
}

/// A unit of work over [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryScope {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    fail_commit: bool,
    sold_out_on_reduce: bool,
}

#[async_trait]
impl TransactionManager for MemoryStore {
    type Scope = MemoryScope;

    async fn begin(&self) -> DbResult<MemoryScope> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryScope {
            guard,
            staged,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
            sold_out_on_reduce: self.sold_out_on_reduce.load(Ordering::SeqCst),
        })
    }
}

#[async_trait]
impl UnitOfWork for MemoryScope {
    async fn commit(self) -> DbResult<()> {
        if self.fail_commit {
            return Err(DbError::TransactionFailed("commit rejected".to_string()));
        }
        let MemoryScope {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        Ok(())
    }
}

impl MemoryScope {
    fn item_mut(&mut self, id: &str) -> DbResult<&mut Item> {
        self.staged
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    fn user_mut(&mut self, id: &str) -> DbResult<&mut User> {
        self.staged
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DbError::not_found("User", id))
    }

    fn user_exists(&self, id: &str) -> bool {
        self.staged.users.iter().any(|u| u.id == id)
    }
}

#[async_trait]
impl CatalogStore for MemoryScope {
    async fn find_item(&mut self, id: &str) -> DbResult<Option<Item>> {
        Ok(self.staged.items.iter().find(|i| i.id == id).cloned())
    }

    async fn insert_item(&mut self, item: &Item) -> DbResult<()> {
        if self.staged.items.iter().any(|i| i.id == item.id) {
            return Err(DbError::duplicate("items.id", &item.id));
        }
        if self.staged.items.iter().any(|i| i.sku == item.sku) {
            return Err(DbError::duplicate("items.sku", &item.sku));
        }
        if item.stock < 0 || item.price_cents < 0 {
            return Err(DbError::CheckViolation {
                message: "stock and price must not be negative".to_string(),
            });
        }
        self.staged.items.push(item.clone());
        Ok(())
    }

    async fn reduce_stock(&mut self, id: &str, quantity: i64) -> DbResult<StockReduction> {
        if quantity <= 0 {
            return Err(DbError::QueryFailed(format!(
                "stock reduction must be positive, got {quantity}"
            )));
        }
        let sold_out = self.sold_out_on_reduce;
        let item = self.item_mut(id)?;
        if sold_out {
            return Ok(StockReduction::Insufficient { available: 0 });
        }
        if item.stock < quantity {
            return Ok(StockReduction::Insufficient {
                available: item.stock,
            });
        }
        item.stock -= quantity;
        item.updated_at = Utc::now();
        Ok(StockReduction::Reduced)
    }

    async fn set_stock(&mut self, id: &str, stock: i64) -> DbResult<Item> {
        if stock < 0 {
            return Err(DbError::CheckViolation {
                message: "stock must not be negative".to_string(),
            });
        }
        let item = self.item_mut(id)?;
        item.stock = stock;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn set_price(&mut self, id: &str, price_cents: i64) -> DbResult<Item> {
        if price_cents < 0 {
            return Err(DbError::CheckViolation {
                message: "price must not be negative".to_string(),
            });
        }
        let item = self.item_mut(id)?;
        item.price_cents = price_cents;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn list_low_stock(&mut self, limit: i64) -> DbResult<Vec<Item>> {
        let mut low: Vec<Item> = self
            .staged
            .items
            .iter()
            .filter(|i| i.is_active && i.is_low_stock())
            .cloned()
            .collect();
        low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.sku.cmp(&b.sku)));
        low.truncate(limit.max(0) as usize);
        Ok(low)
    }
}

#[async_trait]
impl SaleLedger for MemoryScope {
    async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()> {
        if self
            .staged
            .sales
            .iter()
            .any(|s| s.invoice_number == sale.invoice_number)
        {
            return Err(DbError::duplicate("sales.invoice_number", &sale.invoice_number));
        }
        if !self.user_exists(&sale.created_by) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("sale creator {} does not exist", sale.created_by),
            });
        }
        self.staged.sales.push(sale.clone());
        Ok(())
    }

    async fn insert_line(&mut self, line: &SaleLine) -> DbResult<()> {
        let sale_exists = self.staged.sales.iter().any(|s| s.id == line.sale_id);
        let item_exists = self.staged.items.iter().any(|i| i.id == line.item_id);
        if !sale_exists || !item_exists {
            return Err(DbError::ForeignKeyViolation {
                message: format!("sale line {} references a missing row", line.id),
            });
        }
        if line.quantity <= 0 {
            return Err(DbError::CheckViolation {
                message: "quantity must be positive".to_string(),
            });
        }
        self.staged.lines.push(line.clone());
        Ok(())
    }

    async fn find_sale(&mut self, id: &str) -> DbResult<Option<Sale>> {
        Ok(self.staged.sales.iter().find(|s| s.id == id).cloned())
    }

    async fn sale_lines(&mut self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        Ok(self
            .staged
            .lines
            .iter()
            .filter(|l| l.sale_id == sale_id)
            .cloned()
            .collect())
    }

    async fn list_sales(&mut self, page: PageRequest) -> DbResult<(Vec<Sale>, i64)> {
        let total = self.staged.sales.len() as i64;
        let sales = self
            .staged
            .sales
            .iter()
            .rev()
            .skip(page.offset().max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((sales, total))
    }

    async fn update_sale_details(&mut self, id: &str, update: &SaleUpdate) -> DbResult<Sale> {
        let sale = self
            .staged
            .sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        if let Some(v) = &update.customer_name {
            sale.customer_name = Some(v.clone());
        }
        if let Some(v) = &update.customer_phone {
            sale.customer_phone = Some(v.clone());
        }
        if let Some(v) = &update.customer_email {
            sale.customer_email = Some(v.clone());
        }
        if let Some(v) = &update.payment_method {
            sale.payment_method = Some(v.clone());
        }
        if let Some(v) = &update.notes {
            sale.notes = Some(v.clone());
        }
        if let Some(status) = update.payment_status {
            sale.payment_status = status;
        }
        sale.updated_at = Utc::now();
        Ok(sale.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryScope {
    async fn insert_user(&mut self, user: &User) -> DbResult<()> {
        if self.staged.users.iter().any(|u| u.username == user.username) {
            return Err(DbError::duplicate("users.username", &user.username));
        }
        if self.staged.users.iter().any(|u| u.email == user.email) {
            return Err(DbError::duplicate("users.email", &user.email));
        }
        self.staged.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&mut self, id: &str) -> DbResult<Option<User>> {
        Ok(self.staged.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_identifier(&mut self, identifier: &str) -> DbResult<Option<User>> {
        Ok(self
            .staged
            .users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn count_users(&mut self) -> DbResult<i64> {
        Ok(self.staged.users.len() as i64)
    }

    async fn set_user_role(&mut self, id: &str, role: Role) -> DbResult<User> {
        let user = self.user_mut(id)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_user_active(&mut self, id: &str, active: bool) -> DbResult<User> {
        let user = self.user_mut(id)?;
        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn insert_session(&mut self, session: &Session) -> DbResult<()> {
        if self.staged.sessions.iter().any(|s| s.token == session.token) {
            return Err(DbError::duplicate("sessions.token", &session.token));
        }
        if !self.user_exists(&session.user_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("session user {} does not exist", session.user_id),
            });
        }
        self.staged.sessions.push(session.clone());
        Ok(())
    }

    async fn find_session(&mut self, token: &str) -> DbResult<Option<Session>> {
        Ok(self
            .staged
            .sessions
            .iter()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn revoke_session(&mut self, token: &str, at: DateTime<Utc>) -> DbResult<bool> {
        match self.staged.sessions.iter_mut().find(|s| s.token == token) {
            Some(session) => {
                session.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_session(&mut self, token: &str, at: DateTime<Utc>) -> DbResult<()> {
        if let Some(session) = self.staged.sessions.iter_mut().find(|s| s.token == token) {
            session.last_activity = at;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
