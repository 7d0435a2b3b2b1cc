//! # Validation Module
//!
//! Field validators used by the services before any storage work starts.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Request shape (THIS MODULE, CreateSaleRequest::validate)     │
//! │  ├── Required fields, lengths, formats                                 │
//! │  └── Quantities, prices, discounts in range                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business state (inside the unit of work)                     │
//! │  ├── Item exists and is active                                         │
//! │  └── Stock covers the requested quantity                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (sku, invoice_number, username, email, token)             │
//! │  ├── CHECK (stock >= 0, price_cents >= 0)                             │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("BOLT-M8").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::NewItem;
use crate::{MAX_LINE_QUANTITY, MAX_MONEY_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_SKU_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores only
///
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("BOLT-M8").is_ok());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an item name: non-empty, at most 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a username: 3-50 characters of letters, digits, `_`, `.`, `-`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();
    let len = username.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if len < MIN_USERNAME_LEN {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: MIN_USERNAME_LEN,
        });
    }
    if len > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '_', '.', and '-'".to_string(),
        });
    }

    Ok(())
}

/// Loose email check: one `@` with something on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be an email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a plaintext password before hashing: at least 8 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity: 1 to 9 999.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed, anything above
/// [`MAX_MONEY_CENTS`] is not.
///
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_amount_cents("price", cents)
}

fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }

    Ok(())
}

/// Validates an absolute stock level.
pub fn validate_stock_level(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a new catalog item.
pub fn validate_new_item(item: &NewItem) -> ValidationResult<()> {
    validate_sku(&item.sku)?;
    validate_item_name(&item.name)?;
    if item.category_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "category_id".to_string(),
        });
    }
    validate_price_cents(item.price.cents())?;
    validate_amount_cents("cost", item.cost.cents())?;
    validate_stock_level(item.stock)?;
    if item.minimum_stock < 0 {
        return Err(ValidationError::Negative {
            field: "minimum_stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates that `value` is a UUID, naming `field` in the error.
///
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("token", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("token", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
