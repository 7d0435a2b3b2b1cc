//! Error types for the service layer.
//!
//! Every service returns [`ServiceError`]. Lower layers convert into it
//! with `?`:
//!
//! ```text
//! ValidationError ──► ServiceError::Validation
//! CoreError       ──► InsufficientStock / NotFound / Validation / AuthorizationDenied
//! DbError         ──► NotFound / Conflict / Storage
//! ```

use stockroom_core::{Action, CoreError, ValidationError};
use stockroom_db::DbError;

/// Service errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing, malformed, expired or revoked token, or bad credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The actor's role does not allow the operation.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Request rejected before any storage work.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// `requested` is the sale's total for the item across all lines.
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint (invoice number, SKU, username, email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connectivity, commit, or internal storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn denied(action: Action) -> Self {
        ServiceError::AuthorizationDenied(format!("role may not perform {action:?}"))
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        ServiceError::AuthenticationFailed(reason.into())
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::UniqueViolation { .. } => ServiceError::Conflict(err.to_string()),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ServiceError::not_found("Item", id),
            CoreError::InsufficientStock {
                item_id,
                available,
                requested,
            } => ServiceError::InsufficientStock {
                item_id,
                available,
                requested,
            },
            CoreError::UnknownRole(value) => ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: format!("unknown role '{value}'"),
            }
            .into(),
            CoreError::UnknownPaymentStatus(value) => ValidationError::InvalidFormat {
                field: "payment_status".to_string(),
                reason: format!("unknown payment status '{value}'"),
            }
            .into(),
            CoreError::UserManagement(reason) => ServiceError::AuthorizationDenied(reason),
            CoreError::Validation(err) => ServiceError::Validation(err),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_to_service_errors() {
        let err: ServiceError = DbError::duplicate("sales.invoice_number", "INV-1").into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = DbError::not_found("Item", "abc").into();
        assert!(matches!(err, ServiceError::NotFound { ref entity, .. } if entity == "Item"));

        let err: ServiceError = DbError::PoolExhausted.into();
        assert!(matches!(err, ServiceError::Storage(_)));
    }

    #[test]
    fn test_core_errors_map_to_service_errors() {
        let err: ServiceError = CoreError::UserManagement("no".to_string()).into();
        assert!(matches!(err, ServiceError::AuthorizationDenied(_)));

        let err: ServiceError = CoreError::UnknownRole("root".to_string()).into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
