//! # Permission Evaluator
//!
//! Maps `(role, action)` to allow/deny. Pure functions over closed enums:
//! adding a role or an action is a compile error until every match below
//! decides what it may do.
//!
//! ## Permission Matrix
//! ```text
//! ┌──────────────────────────────┬─────────┬─────────┬─────────────┐
//! │ Action                       │  staff  │  admin  │ super_admin │
//! ├──────────────────────────────┼─────────┼─────────┼─────────────┤
//! │ ReadMasterData               │   ✓     │   ✓     │     ✓       │
//! │ Create/Update/DeleteMaster   │   ✗     │   ✓     │     ✓       │
//! │ UpdateStock                  │   ✓     │   ✓     │     ✓       │
//! │ CheckMinimumStock            │   ✓     │   ✓     │     ✓       │
//! │ CreateSale / ViewSale        │   ✓     │   ✓     │     ✓       │
//! │ UpdateSale                   │   ✗     │   ✓     │     ✓       │
//! │ ManageUsers / AccessReports  │   ✗     │   ✓     │     ✓       │
//! └──────────────────────────────┴─────────┴─────────┴─────────────┘
//! ```
//!
//! Services do not call [`can_perform`] directly; they hold a
//! [`PermissionPolicy`] so a deployment (or a test) can substitute its own
//! rules without touching service code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::User;

// =============================================================================
// Role
// =============================================================================

/// User role. Stored as `staff`, `admin`, or `super_admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Admin,
    SuperAdmin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 3] = [Role::Staff, Role::Admin, Role::SuperAdmin];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

// =============================================================================
// Action
// =============================================================================

/// Everything a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ReadMasterData,
    CreateMasterData,
    UpdateMasterData,
    DeleteMasterData,
    UpdateStock,
    CheckMinimumStock,
    CreateSale,
    ViewSale,
    UpdateSale,
    ManageUsers,
    AccessReports,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::ReadMasterData,
        Action::CreateMasterData,
        Action::UpdateMasterData,
        Action::DeleteMasterData,
        Action::UpdateStock,
        Action::CheckMinimumStock,
        Action::CreateSale,
        Action::ViewSale,
        Action::UpdateSale,
        Action::ManageUsers,
        Action::AccessReports,
    ];
}

// =============================================================================
// Evaluator
// =============================================================================

/// Returns whether `role` may perform `action`.
pub const fn can_perform(role: Role, action: Action) -> bool {
    match action {
        // Day-to-day warehouse work: every role.
        Action::ReadMasterData
        | Action::UpdateStock
        | Action::CheckMinimumStock
        | Action::CreateSale
        | Action::ViewSale => true,

        // Catalog maintenance, sale corrections, users, reports: admins only.
        Action::CreateMasterData
        | Action::UpdateMasterData
        | Action::DeleteMasterData
        | Action::UpdateSale
        | Action::ManageUsers
        | Action::AccessReports => match role {
            Role::Staff => false,
            Role::Admin | Role::SuperAdmin => true,
        },
    }
}

/// Evaluates a raw role string. Unknown roles are denied everything.
pub fn role_can(role: &str, action: Action) -> bool {
    role.parse::<Role>()
        .map(|role| can_perform(role, action))
        .unwrap_or(false)
}

/// Injectable permission capability.
pub trait PermissionPolicy: Send + Sync {
    fn can_perform(&self, role: Role, action: Action) -> bool;
}

/// The standard role matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl PermissionPolicy for RolePolicy {
    fn can_perform(&self, role: Role, action: Action) -> bool {
        can_perform(role, action)
    }
}

// =============================================================================
// User Management Rules
// =============================================================================

/// Whether `actor` may create an account with `target` role.
///
/// super_admin creates anyone; admin creates admin or staff; staff nobody.
pub fn can_create_user(actor: Role, target: Role) -> CoreResult<()> {
    match (actor, target) {
        (Role::SuperAdmin, _) => Ok(()),
        (Role::Admin, Role::SuperAdmin) => Err(CoreError::UserManagement(
            "admin cannot create super_admin".to_string(),
        )),
        (Role::Admin, Role::Admin | Role::Staff) => Ok(()),
        (Role::Staff, _) => Err(CoreError::UserManagement(
            "insufficient permission".to_string(),
        )),
    }
}

/// Whether `actor` may update `target`, optionally assigning `new_role`.
pub fn can_update_user(actor: &User, target: &User, new_role: Option<Role>) -> CoreResult<()> {
    if actor.id == target.id && new_role.is_some_and(|r| r != actor.role) {
        return Err(CoreError::UserManagement(
            "cannot change your own role".to_string(),
        ));
    }

    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::Admin => {
            if target.role == Role::SuperAdmin || new_role == Some(Role::SuperAdmin) {
                Err(CoreError::UserManagement(
                    "admin cannot modify super_admin".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        Role::Staff => Err(CoreError::UserManagement(
            "insufficient permission".to_string(),
        )),
    }
}

/// Whether `actor` may delete (deactivate) `target`.
pub fn can_delete_user(actor: &User, target: &User) -> CoreResult<()> {
    if actor.id == target.id {
        return Err(CoreError::UserManagement(
            "cannot delete your own account".to_string(),
        ));
    }

    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::Admin if target.role == Role::SuperAdmin => Err(CoreError::UserManagement(
            "admin cannot delete super_admin".to_string(),
        )),
        Role::Admin => Ok(()),
        Role::Staff => Err(CoreError::UserManagement(
            "insufficient permission".to_string(),
        )),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{}@example.com", id),
            password_hash: String::new(),
            full_name: id.to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_every_role_can_sell() {
        for role in Role::ALL {
            assert!(can_perform(role, Action::CreateSale), "{role} should sell");
            assert!(can_perform(role, Action::ViewSale));
        }
    }

    #[test]
    fn test_staff_cannot_maintain_catalog() {
        assert!(!can_perform(Role::Staff, Action::CreateMasterData));
        assert!(!can_perform(Role::Staff, Action::UpdateMasterData));
        assert!(!can_perform(Role::Staff, Action::DeleteMasterData));
        assert!(!can_perform(Role::Staff, Action::UpdateSale));
        assert!(!can_perform(Role::Staff, Action::ManageUsers));
        assert!(!can_perform(Role::Staff, Action::AccessReports));
        assert!(can_perform(Role::Staff, Action::UpdateStock));
    }

    #[test]
    fn test_admins_can_do_everything() {
        for action in Action::ALL {
            assert!(can_perform(Role::Admin, action));
            assert!(can_perform(Role::SuperAdmin, action));
        }
    }

    #[test]
    fn test_unknown_role_is_denied_everything() {
        for action in Action::ALL {
            assert!(!role_can("guest", action));
            assert!(!role_can("", action));
        }
        assert!(role_can("staff", Action::CreateSale));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_can_create_user() {
        assert!(can_create_user(Role::SuperAdmin, Role::SuperAdmin).is_ok());
        assert!(can_create_user(Role::Admin, Role::Staff).is_ok());
        assert!(can_create_user(Role::Admin, Role::Admin).is_ok());
        assert!(can_create_user(Role::Admin, Role::SuperAdmin).is_err());
        assert!(can_create_user(Role::Staff, Role::Staff).is_err());
    }

    #[test]
    fn test_can_update_user() {
        let root = user("root", Role::SuperAdmin);
        let admin = user("admin", Role::Admin);
        let staff = user("staff", Role::Staff);

        assert!(can_update_user(&admin, &admin, Some(Role::SuperAdmin)).is_err());
        assert!(can_update_user(&admin, &admin, Some(Role::Admin)).is_ok());
        assert!(can_update_user(&admin, &root, None).is_err());
        assert!(can_update_user(&admin, &staff, Some(Role::SuperAdmin)).is_err());
        assert!(can_update_user(&admin, &staff, Some(Role::Admin)).is_ok());
        assert!(can_update_user(&root, &admin, Some(Role::Staff)).is_ok());
        assert!(can_update_user(&staff, &staff, None).is_err());
    }

    #[test]
    fn test_can_delete_user() {
        let root = user("root", Role::SuperAdmin);
        let admin = user("admin", Role::Admin);
        let staff = user("staff", Role::Staff);

        assert!(can_delete_user(&root, &root).is_err());
        assert!(can_delete_user(&root, &admin).is_ok());
        assert!(can_delete_user(&admin, &root).is_err());
        assert!(can_delete_user(&admin, &staff).is_ok());
        assert!(can_delete_user(&staff, &admin).is_err());
    }
}
