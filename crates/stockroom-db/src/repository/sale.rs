//! # Sale Repository
//!
//! Sale headers and sale lines. There is no delete: the ledger only grows,
//! and a mistaken sale is cancelled through its payment status.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{PageRequest, Sale, SaleLine, SaleUpdate};

const SELECT_SALE: &str = r#"
    SELECT
        id, invoice_number, customer_name, customer_phone, customer_email,
        sale_date, total_amount_cents, discount_cents, tax_cents, grand_total_cents,
        payment_method, payment_status, notes, created_by, created_at, updated_at
    FROM sales
"#;

pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, invoice_number = %sale.invoice_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, customer_name, customer_phone, customer_email,
            sale_date, total_amount_cents, discount_cents, tax_cents, grand_total_cents,
            payment_method, payment_status, notes, created_by, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.invoice_number)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(&sale.customer_email)
    .bind(sale.sale_date)
    .bind(sale.total_amount_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.grand_total_cents)
    .bind(&sale.payment_method)
    .bind(sale.payment_status)
    .bind(&sale.notes)
    .bind(&sale.created_by)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &sale.invoice_number),
        other => other,
    })?;

    Ok(())
}

/// Inserts one line. The unit price is whatever the caller captured.
pub async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    debug!(sale_id = %line.sale_id, item_id = %line.item_id, quantity = line.quantity, "Adding sale line");

    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, item_id, quantity,
            unit_price_cents, discount_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.item_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.discount_cents)
    .bind(line.subtotal_cents)
    .bind(line.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(sale)
}

pub async fn lines(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLine>> {
    let lines = sqlx::query_as::<_, SaleLine>(
        r#"
        SELECT
            id, sale_id, item_id, quantity,
            unit_price_cents, discount_cents, subtotal_cents, created_at
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

/// One page of sales, newest first, and the total number of sales.
pub async fn list(conn: &mut SqliteConnection, page: PageRequest) -> DbResult<(Vec<Sale>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(&mut *conn)
        .await?;

    let sales = sqlx::query_as::<_, Sale>(&format!(
        "{SELECT_SALE} ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
    ))
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    Ok((sales, total))
}

/// Applies the editable fields of `update`. Totals and lines are not
/// reachable from here.
pub async fn update_details(
    conn: &mut SqliteConnection,
    id: &str,
    update: &SaleUpdate,
) -> DbResult<Sale> {
    debug!(id = %id, "Updating sale details");

    let result = sqlx::query(
        r#"
        UPDATE sales SET
            customer_name  = COALESCE(?1, customer_name),
            customer_phone = COALESCE(?2, customer_phone),
            customer_email = COALESCE(?3, customer_email),
            payment_method = COALESCE(?4, payment_method),
            notes          = COALESCE(?5, notes),
            payment_status = COALESCE(?6, payment_status),
            updated_at     = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&update.customer_name)
    .bind(&update.customer_phone)
    .bind(&update.customer_email)
    .bind(&update.payment_method)
    .bind(&update.notes)
    .bind(update.payment_status)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", id));
    }

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_item, sample_line, sample_sale, sample_user, test_db};
    use crate::repository::{item, user};
    use stockroom_core::{PaymentStatus, Role};

    #[tokio::test]
    async fn test_insert_sale_with_lines() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let cashier = sample_user("cashier", Role::Staff);
        user::insert(&mut conn, &cashier).await.unwrap();
        let it = sample_item("BOLT-M8", 10_000, 10);
        item::insert(&mut conn, &it).await.unwrap();

        let sale = sample_sale("INV-1", &cashier.id);
        insert_sale(&mut conn, &sale).await.unwrap();
        insert_line(&mut conn, &sample_line(&sale.id, &it.id, 1)).await.unwrap();
        insert_line(&mut conn, &sample_line(&sale.id, &it.id, 2)).await.unwrap();

        let found = find_by_id(&mut conn, &sale.id).await.unwrap().unwrap();
        assert_eq!(found.payment_status, PaymentStatus::Pending);
        let found_lines = lines(&mut conn, &sale.id).await.unwrap();
        assert_eq!(found_lines.len(), 2);
        assert_eq!(found_lines[0].quantity, 1);
        assert_eq!(found_lines[1].quantity, 2);
    }

    #[tokio::test]
    async fn test_duplicate_invoice_is_unique_violation() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let cashier = sample_user("cashier", Role::Staff);
        user::insert(&mut conn, &cashier).await.unwrap();

        insert_sale(&mut conn, &sample_sale("INV-1", &cashier.id)).await.unwrap();
        let err = insert_sale(&mut conn, &sample_sale("INV-1", &cashier.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_line_requires_existing_sale() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let it = sample_item("BOLT-M8", 10_000, 10);
        item::insert(&mut conn, &it).await.unwrap();

        let err = insert_line(&mut conn, &sample_line("no-such-sale", &it.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_details_keeps_totals() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let cashier = sample_user("cashier", Role::Staff);
        user::insert(&mut conn, &cashier).await.unwrap();
        let sale = sample_sale("INV-1", &cashier.id);
        insert_sale(&mut conn, &sale).await.unwrap();

        let update = SaleUpdate {
            customer_name: Some("Acme Ltd".to_string()),
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        let updated = update_details(&mut conn, &sale.id, &update).await.unwrap();

        assert_eq!(updated.customer_name.as_deref(), Some("Acme Ltd"));
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        assert_eq!(updated.grand_total_cents, sale.grand_total_cents);
        assert_eq!(updated.notes, sale.notes);
    }

    #[tokio::test]
    async fn test_update_missing_sale() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = update_details(&mut conn, "missing", &SaleUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_pages_newest_first() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let cashier = sample_user("cashier", Role::Staff);
        user::insert(&mut conn, &cashier).await.unwrap();
        for n in 1..=3 {
            insert_sale(&mut conn, &sample_sale(&format!("INV-{n}"), &cashier.id))
                .await
                .unwrap();
        }

        let (first, total) = list(&mut conn, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].invoice_number, "INV-3");

        let (second, _) = list(&mut conn, PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].invoice_number, "INV-1");
    }
}
