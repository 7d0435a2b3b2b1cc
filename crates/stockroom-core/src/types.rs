//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  invoice_number │   │  sale_id (FK)   │       │
//! │  │  price_cents    │   │  grand_total    │   │  item_id (FK)   │       │
//! │  │  stock ≥ 0      │   │  payment_status │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Session     │   │  RecordedSale   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  username       │   │  token (UUID)   │   │  sale           │       │
//! │  │  role           │   │  expired_at     │   │  lines          │       │
//! │  │  password_hash  │   │  revoked_at     │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, invoice_number, username) - human-readable, unique

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;
use crate::money::Money;
use crate::permission::Role;

// =============================================================================
// Item
// =============================================================================

/// A stocked catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Category this item is filed under.
    pub category_id: String,

    /// Rack the item is shelved on, if assigned.
    pub rack_id: Option<String>,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,

    pub description: Option<String>,

    /// Unit of measure (`pcs`, `box`, `kg`, ...).
    pub unit: String,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents.
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Reorder threshold for the low-stock report.
    pub minimum_stock: i64,

    /// Inactive items cannot be sold.
    pub is_active: bool,

    pub created_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// At or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.minimum_stock
    }

    /// Whether `quantity` units can be taken from stock right now.
    pub fn can_supply(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.stock >= quantity
    }
}

/// Fields for a new catalog item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub category_id: String,
    pub rack_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `pcs` when absent.
    pub unit: Option<String>,
    pub price: Money,
    pub cost: Money,
    pub stock: i64,
    pub minimum_stock: i64,
}

impl NewItem {
    /// Builds the row for this item, stamped with a fresh id.
    pub fn into_item(self, created_by: Option<String>, now: DateTime<Utc>) -> Item {
        Item {
            id: Uuid::new_v4().to_string(),
            category_id: self.category_id,
            rack_id: self.rack_id,
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description,
            unit: self
                .unit
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            price_cents: self.price.cents(),
            cost_cents: self.cost.cents(),
            stock: self.stock,
            minimum_stock: self.minimum_stock,
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Unit of measure used when none is given.
pub const DEFAULT_UNIT: &str = "pcs";

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state of a recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Every new sale starts here.
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(CoreError::UnknownPaymentStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale header.
///
/// Totals are fixed at creation; only customer metadata, payment method,
/// notes, and payment status change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Human-readable invoice number, unique across all sales.
    pub invoice_number: String,

    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    /// Sum of line subtotals.
    pub total_amount_cents: i64,

    /// Header-level discount.
    pub discount_cents: i64,

    /// Header-level tax.
    pub tax_cents: i64,

    /// total - discount + tax. May be negative.
    pub grand_total_cents: i64,

    pub payment_method: Option<String>,

    pub payment_status: PaymentStatus,

    pub notes: Option<String>,

    /// User who recorded the sale.
    pub created_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// One line of a recorded sale.
///
/// `unit_price_cents` is the item price captured when the sale was made;
/// later price changes never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    /// quantity × unit_price − discount.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale header together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecordedSale {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// User
// =============================================================================

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Session
// =============================================================================

/// Client metadata recorded with a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A login session identified by an opaque bearer token.
///
/// ## Lifecycle
/// ```text
///   issue ──► valid ──┬──► expired   (now ≥ expired_at)
///                     └──► revoked   (revoked_at set, permanent)
/// ```
/// Sessions are never deleted; expired and revoked rows stay for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub expired_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub last_activity: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    /// Builds a fresh session with a random token, valid for `ttl` from `now`.
    pub fn issue(user_id: &str, ttl: Duration, client: ClientInfo, now: DateTime<Utc>) -> Self {
        Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token: Uuid::new_v4().to_string(),
            created_at: now,
            expired_at: now + ttl,
            revoked_at: None,
            last_activity: now,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        }
    }

    /// Not revoked and strictly before expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expired_at
    }

    #[inline]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(stock: i64, minimum_stock: i64) -> Item {
        let now = Utc::now();
        Item {
            id: "item-1".to_string(),
            category_id: "cat-1".to_string(),
            rack_id: None,
            sku: "BOLT-M8".to_string(),
            name: "M8 bolt".to_string(),
            description: None,
            unit: DEFAULT_UNIT.to_string(),
            price_cents: 10_000,
            cost_cents: 6_000,
            stock,
            minimum_stock,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_item_can_supply() {
        let mut it = item(10, 2);
        assert!(it.can_supply(10));
        assert!(!it.can_supply(11));
        assert!(!it.can_supply(0));

        it.is_active = false;
        assert!(!it.can_supply(1));
    }

    #[test]
    fn test_item_low_stock() {
        assert!(item(2, 2).is_low_stock());
        assert!(!item(3, 2).is_low_stock());
    }

    #[test]
    fn test_new_item_defaults_unit() {
        let new = NewItem {
            category_id: "cat-1".to_string(),
            rack_id: None,
            sku: " BOLT-M8 ".to_string(),
            name: "M8 bolt".to_string(),
            description: None,
            unit: Some("  ".to_string()),
            price: Money::from_cents(100),
            cost: Money::from_cents(60),
            stock: 5,
            minimum_stock: 1,
        };
        let it = new.into_item(None, Utc::now());
        assert_eq!(it.unit, "pcs");
        assert_eq!(it.sku, "BOLT-M8");
        assert!(it.is_active);
    }

    #[test]
    fn test_payment_status_parsing() {
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_session_validity_boundary() {
        let now = Utc::now();
        let session = Session::issue("user-1", Duration::hours(24), ClientInfo::default(), now);

        assert!(session.is_valid_at(now));
        assert!(session.is_valid_at(session.expired_at - Duration::milliseconds(1)));
        assert!(!session.is_valid_at(session.expired_at));
        assert!(!session.is_valid_at(session.expired_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_revoked_session_is_invalid() {
        let now = Utc::now();
        let mut session = Session::issue("user-1", Duration::hours(1), ClientInfo::default(), now);
        session.revoked_at = Some(now);
        assert!(!session.is_valid_at(now));
        assert!(session.is_revoked());
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let now = Utc::now();
        let a = Session::issue("u", Duration::hours(1), ClientInfo::default(), now);
        let b = Session::issue("u", Duration::hours(1), ClientInfo::default(), now);
        assert_ne!(a.token, b.token);
        assert!(Uuid::parse_str(&a.token).is_ok());
    }

    #[test]
    fn test_user_json_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: "u-1".to_string(),
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Root".to_string(),
            role: Role::SuperAdmin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "super_admin");

        let back: User = serde_json::from_value(json).unwrap();
        assert!(back.password_hash.is_empty());
    }
}
