//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the domain model of the warehouse backend as pure
//! functions and plain data. Nothing here touches a database, a clock, or
//! the network: callers pass `now` in when time matters.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-service                              │   │
//! │  │    AuthService ──► SaleService ──► CatalogService               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │  types   │ │  money   │ │ permission │ │     sale     │    │   │
//! │  │   │  Item    │ │  Money   │ │ Role       │ │ pricing and  │    │   │
//! │  │   │  Sale    │ │          │ │ Action     │ │ stock demand │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, unit of work, repositories   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Sale, SaleLine, Session, User)
//! - [`money`] - Money type with integer arithmetic
//! - [`permission`] - Roles, actions, and the permission evaluator
//! - [`sale`] - Sale requests, line pricing, and per-item stock demand
//! - [`pagination`] - Page requests and page math
//! - [`validation`] - Field validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::sale::price_line;
//!
//! // 3 units at $100.00 with a $5.00 line discount
//! let subtotal = price_line(Money::from_cents(10_000), 3, Money::from_cents(500)).unwrap();
//! assert_eq!(subtotal.cents(), 29_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pagination;
pub mod permission;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use pagination::{PageRequest, Paginated};
pub use permission::{Action, PermissionPolicy, Role, RolePolicy};
pub use sale::{CreateSaleRequest, SaleLineRequest, SaleUpdate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single sale line.
///
/// Guards against typos such as 10000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum number of lines in one sale request.
pub const MAX_SALE_LINES: usize = 200;

/// Maximum length of an invoice number.
pub const MAX_INVOICE_NUMBER_LEN: usize = 50;

/// Largest accepted price, cost, discount, or tax, in cents ($10 billion).
///
/// At this ceiling a full sale (`MAX_SALE_LINES` lines of
/// `MAX_LINE_QUANTITY` units) still fits in an `i64`.
pub const MAX_MONEY_CENTS: i64 = 1_000_000_000_000;
