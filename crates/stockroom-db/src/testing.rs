//! Fixtures shared by the unit tests of this crate.

use chrono::Utc;
use uuid::Uuid;

use crate::pool::{Database, DbConfig};
use stockroom_core::{Item, PaymentStatus, Role, Sale, SaleLine, User, DEFAULT_UNIT};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) fn sample_item(sku: &str, price_cents: i64, stock: i64) -> Item {
    let now = Utc::now();
    Item {
        id: Uuid::new_v4().to_string(),
        category_id: "hardware".to_string(),
        rack_id: None,
        sku: sku.to_string(),
        name: format!("Item {sku}"),
        description: None,
        unit: DEFAULT_UNIT.to_string(),
        price_cents,
        cost_cents: price_cents / 2,
        stock,
        minimum_stock: 0,
        is_active: true,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_user(username: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        full_name: username.to_string(),
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_sale(invoice_number: &str, created_by: &str) -> Sale {
    let now = Utc::now();
    Sale {
        id: Uuid::new_v4().to_string(),
        invoice_number: invoice_number.to_string(),
        customer_name: None,
        customer_phone: None,
        customer_email: None,
        sale_date: now,
        total_amount_cents: 29_500,
        discount_cents: 1_000,
        tax_cents: 200,
        grand_total_cents: 28_700,
        payment_method: Some("cash".to_string()),
        payment_status: PaymentStatus::Pending,
        notes: Some("counter sale".to_string()),
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_line(sale_id: &str, item_id: &str, quantity: i64) -> SaleLine {
    SaleLine {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        item_id: item_id.to_string(),
        quantity,
        unit_price_cents: 10_000,
        discount_cents: 0,
        subtotal_cents: 10_000 * quantity,
        created_at: Utc::now(),
    }
}
