//! # Item Repository
//!
//! Catalog items and the guarded stock decrement.
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE items SET stock = stock - :qty                                 │
//! │   WHERE id = :id AND stock >= :qty                                     │
//! │                                                                         │
//! │  rows_affected = 1 → Reduced                                           │
//! │  rows_affected = 0 → look the row up:                                  │
//! │                        missing  → NotFound                             │
//! │                        present  → Insufficient { available }           │
//! │                                                                         │
//! │  The check and the write are one statement, so two writers can never  │
//! │  both see "enough" and both subtract.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::StockReduction;
use stockroom_core::Item;

const SELECT_ITEM: &str = r#"
    SELECT
        id, category_id, rack_id, sku, name, description, unit,
        price_cents, cost_cents, stock, minimum_stock, is_active,
        created_by, created_at, updated_at
    FROM items
"#;

// =============================================================================
// Queries
// =============================================================================

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(&format!("{SELECT_ITEM} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(item)
}

pub async fn insert(conn: &mut SqliteConnection, item: &Item) -> DbResult<()> {
    debug!(id = %item.id, sku = %item.sku, "Inserting item");

    sqlx::query(
        r#"
        INSERT INTO items (
            id, category_id, rack_id, sku, name, description, unit,
            price_cents, cost_cents, stock, minimum_stock, is_active,
            created_by, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.category_id)
    .bind(&item.rack_id)
    .bind(&item.sku)
    .bind(&item.name)
    .bind(&item.description)
    .bind(&item.unit)
    .bind(item.price_cents)
    .bind(item.cost_cents)
    .bind(item.stock)
    .bind(item.minimum_stock)
    .bind(item.is_active)
    .bind(&item.created_by)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &item.sku),
        other => other,
    })?;

    Ok(())
}

/// Guarded decrement. See the module docs.
pub async fn reduce_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<StockReduction> {
    if quantity <= 0 {
        return Err(DbError::QueryFailed(format!(
            "stock reduction must be positive, got {quantity}"
        )));
    }

    debug!(id = %id, quantity = quantity, "Reducing stock");

    let result = sqlx::query(
        r#"
        UPDATE items
        SET stock = stock - ?1, updated_at = ?2
        WHERE id = ?3 AND stock >= ?1
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(StockReduction::Reduced);
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM items WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => Ok(StockReduction::Insufficient { available }),
        None => Err(DbError::not_found("Item", id)),
    }
}

pub async fn set_stock(conn: &mut SqliteConnection, id: &str, stock: i64) -> DbResult<Item> {
    debug!(id = %id, stock = stock, "Setting stock");

    let result = sqlx::query("UPDATE items SET stock = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(stock)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", id));
    }

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Item", id))
}

pub async fn set_price(conn: &mut SqliteConnection, id: &str, price_cents: i64) -> DbResult<Item> {
    debug!(id = %id, price_cents = price_cents, "Setting price");

    let result = sqlx::query("UPDATE items SET price_cents = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(price_cents)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", id));
    }

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Item", id))
}

pub async fn list_low_stock(conn: &mut SqliteConnection, limit: i64) -> DbResult<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(&format!(
        "{SELECT_ITEM} WHERE is_active = 1 AND stock <= minimum_stock ORDER BY stock ASC, sku ASC LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

pub async fn count(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

// =============================================================================
// Pool Repository
// =============================================================================

/// Pool-backed access to items outside a unit of work, for the seeding
/// tool and the startup catalog summary.
///
/// ## Usage
/// ```rust,ignore
/// let low = db.items().list_low_stock(100).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, item).await
    }

    pub async fn list_low_stock(&self, limit: i64) -> DbResult<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        list_low_stock(&mut conn, limit).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count(&mut conn).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
