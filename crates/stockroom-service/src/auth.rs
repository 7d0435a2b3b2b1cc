//! # Authentication & User Management
//!
//! Turns bearer tokens into an [`Actor`] and manages accounts.
//!
//! ## Login / Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(identifier, password)                                           │
//! │    ├── scope: find user by username or email, then drop the scope     │
//! │    ├── argon2 verify on the blocking pool                              │
//! │    └── scope: insert session (uuid token, configured lifetime), commit│
//! │                                                                         │
//! │  authenticate(token)                                                    │
//! │    ├── token must be a UUID                                            │
//! │    ├── session exists, not revoked, now < expired_at                  │
//! │    ├── user exists and is active                                       │
//! │    └── touch last_activity, commit → Actor                            │
//! │                                                                         │
//! │  logout(token) → revoke (idempotent, first revocation time kept)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bad usernames, bad passwords and inactive accounts all fail with the same
//! "invalid credentials" message.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use stockroom_core::permission::{can_create_user, can_delete_user, can_update_user};
use stockroom_core::validation::{
    validate_email, validate_password, validate_username, validate_uuid,
};
use stockroom_core::{Action, ClientInfo, PermissionPolicy, Role, User};
use stockroom_db::{AccountStore, TransactionManager, UnitOfWork};

use crate::error::{ServiceError, ServiceResult};

const INVALID_CREDENTIALS: &str = "invalid credentials";

// =============================================================================
// Types
// =============================================================================

/// The authenticated caller of an operation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    /// Token of the session the actor was resolved from. Mutating calls
    /// re-read that session inside their unit of work.
    pub session_token: String,
    /// Expiry of that session, as of `authenticate`.
    pub session_expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("session_expires_at", &self.session_expires_at)
            .finish_non_exhaustive()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Account to register.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Authorization Gate
// =============================================================================

/// Checks, at call time, that the actor's session has not expired and that
/// the policy allows `action` for the actor's role.
///
/// Works from the cached [`Actor`] only. Calls that write also run
/// [`require_live_session`] inside their unit of work.
pub fn authorize(
    policy: &dyn PermissionPolicy,
    actor: &Actor,
    action: Action,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    if now >= actor.session_expires_at {
        return Err(ServiceError::unauthenticated("session expired"));
    }
    if !policy.can_perform(actor.role, action) {
        warn!(user = %actor.username, role = %actor.role, ?action, "Permission denied");
        return Err(ServiceError::denied(action));
    }
    Ok(())
}

/// Re-reads the actor's session in `scope`: it must exist, belong to the
/// actor, be unrevoked with `now < expired_at`, and its user must still be
/// active. A logout or deactivation after `authenticate` is seen here.
pub async fn require_live_session<S: AccountStore>(
    scope: &mut S,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    let session = scope
        .find_session(&actor.session_token)
        .await?
        .filter(|session| session.user_id == actor.user_id)
        .ok_or_else(|| ServiceError::unauthenticated("unknown session"))?;
    if session.is_revoked() {
        return Err(ServiceError::unauthenticated("session revoked"));
    }
    if !session.is_valid_at(now) {
        return Err(ServiceError::unauthenticated("session expired"));
    }

    let active = scope
        .find_user(&actor.user_id)
        .await?
        .is_some_and(|user| user.is_active);
    if !active {
        return Err(ServiceError::unauthenticated("user inactive"));
    }
    Ok(())
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with Argon2id on the blocking pool.
pub async fn hash_password(password: &str) -> ServiceResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::Storage(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| ServiceError::Storage(format!("password hashing task failed: {e}")))?
}

/// Verifies a password against a stored PHC string. A malformed hash never
/// matches.
pub async fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    })
    .await
    .map_err(|e| ServiceError::Storage(format!("password verification task failed: {e}")))
}

// =============================================================================
// Auth Service
// =============================================================================

/// Sessions, identity resolution, and account management.
#[derive(Clone)]
pub struct AuthService<T> {
    store: T,
    policy: Arc<dyn PermissionPolicy>,
    session_lifetime: Duration,
}

impl<T: TransactionManager> AuthService<T> {
    pub fn new(store: T, policy: Arc<dyn PermissionPolicy>, session_lifetime: Duration) -> Self {
        AuthService {
            store,
            policy,
            session_lifetime,
        }
    }

    /// Verifies credentials and opens a session.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        client: ClientInfo,
    ) -> ServiceResult<LoginGrant> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
        }

        let user = {
            let mut scope = self.store.begin().await?;
            let user = scope.find_user_by_identifier(identifier).await?;
            scope.rollback().await?;
            user
        };

        let user = match user {
            Some(user) if user.is_active => user,
            Some(_) => {
                warn!(identifier, "Login rejected for inactive user");
                return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
            }
            None => {
                warn!(identifier, "Login rejected for unknown user");
                return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
            }
        };

        if !verify_password(password, &user.password_hash).await? {
            warn!(user = %user.username, "Login rejected: wrong password");
            return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
        }

        let mut scope = self.store.begin().await?;
        let session = scope
            .create_session(&user.id, self.session_lifetime, client, Utc::now())
            .await?;
        scope.commit().await?;

        info!(user = %user.username, role = %user.role, "User logged in");

        Ok(LoginGrant {
            token: session.token,
            expires_at: session.expired_at,
            user,
        })
    }

    /// Revokes the session behind `token`. Unknown tokens are a no-op.
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        let token = token.trim();
        if validate_uuid("token", token).is_err() {
            return Ok(());
        }

        let mut scope = self.store.begin().await?;
        let existed = scope.revoke_session(token, Utc::now()).await?;
        scope.commit().await?;

        debug!(existed, "Session revoked");
        Ok(())
    }

    /// Resolves a bearer token to the acting user.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Actor> {
        self.authenticate_at(token, Utc::now()).await
    }

    /// [`authenticate`](Self::authenticate) with an explicit clock.
    pub async fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<Actor> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::unauthenticated("missing token"));
        }
        if validate_uuid("token", token).is_err() {
            return Err(ServiceError::unauthenticated("malformed token"));
        }

        let mut scope = self.store.begin().await?;

        let session = scope
            .find_session(token)
            .await?
            .ok_or_else(|| ServiceError::unauthenticated("unknown session"))?;
        if session.is_revoked() {
            return Err(ServiceError::unauthenticated("session revoked"));
        }
        if !session.is_valid_at(now) {
            return Err(ServiceError::unauthenticated("session expired"));
        }

        let user = scope
            .find_user(&session.user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ServiceError::unauthenticated("user inactive"))?;

        scope.touch_session(token, now).await?;
        scope.commit().await?;

        Ok(Actor {
            user_id: user.id,
            username: user.username,
            role: user.role,
            session_token: session.token,
            session_expires_at: session.expired_at,
        })
    }

    /// Creates an account on behalf of `actor`.
    pub async fn register_user(&self, actor: &Actor, new_user: NewUser) -> ServiceResult<User> {
        authorize(self.policy.as_ref(), actor, Action::ManageUsers, Utc::now())?;
        can_create_user(actor.role, new_user.role)?;

        let user = self.build_user(new_user).await?;

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, Utc::now()).await?;
        scope.insert_user(&user).await?;
        scope.commit().await?;

        info!(
            actor = %actor.username,
            user = %user.username,
            role = %user.role,
            "User registered"
        );
        Ok(user)
    }

    /// Creates the first super admin. Does nothing once any user exists.
    pub async fn bootstrap_super_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<Option<User>> {
        if self.count_users().await? > 0 {
            return Ok(None);
        }

        let user = self
            .build_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                full_name: username.to_string(),
                role: Role::SuperAdmin,
            })
            .await?;

        let mut scope = self.store.begin().await?;
        if scope.count_users().await? > 0 {
            return Ok(None);
        }
        scope.insert_user(&user).await?;
        scope.commit().await?;

        info!(user = %user.username, "Bootstrap super admin created");
        Ok(Some(user))
    }

    /// Assigns a new role to `user_id`.
    pub async fn change_role(&self, actor: &Actor, user_id: &str, role: Role) -> ServiceResult<User> {
        let now = Utc::now();
        authorize(self.policy.as_ref(), actor, Action::ManageUsers, now)?;

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, now).await?;
        let (acting, target) = load_pair(&mut scope, actor, user_id).await?;
        can_update_user(&acting, &target, Some(role))?;

        let updated = scope.set_user_role(user_id, role).await?;
        scope.commit().await?;

        info!(actor = %actor.username, user = %updated.username, role = %role, "Role changed");
        Ok(updated)
    }

    /// Deactivates `user_id`. Their sessions stop authenticating at once.
    pub async fn deactivate_user(&self, actor: &Actor, user_id: &str) -> ServiceResult<User> {
        let now = Utc::now();
        authorize(self.policy.as_ref(), actor, Action::ManageUsers, now)?;

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, now).await?;
        let (acting, target) = load_pair(&mut scope, actor, user_id).await?;
        can_delete_user(&acting, &target)?;

        let updated = scope.set_user_active(user_id, false).await?;
        scope.commit().await?;

        info!(actor = %actor.username, user = %updated.username, "User deactivated");
        Ok(updated)
    }

    async fn count_users(&self) -> ServiceResult<i64> {
        let mut scope = self.store.begin().await?;
        let count = scope.count_users().await?;
        scope.rollback().await?;
        Ok(count)
    }

    async fn build_user(&self, new_user: NewUser) -> ServiceResult<User> {
        let username = new_user.username.trim().to_string();
        let email = new_user.email.trim().to_string();
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&new_user.password)?;

        let full_name = match new_user.full_name.trim() {
            "" => username.clone(),
            name => name.to_string(),
        };

        let password_hash = hash_password(&new_user.password).await?;
        let now = Utc::now();

        Ok(User {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            full_name,
            role: new_user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Loads the acting user and the target user inside one scope.
async fn load_pair<S: UnitOfWork>(
    scope: &mut S,
    actor: &Actor,
    user_id: &str,
) -> ServiceResult<(User, User)> {
    validate_uuid("user_id", user_id).map_err(ServiceError::from)?;

    let acting = scope
        .find_user(&actor.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ServiceError::unauthenticated("user inactive"))?;
    let target = scope
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", user_id))?;

    if acting.role != actor.role {
        return Err(ServiceError::unauthenticated("role changed since login"));
    }
    Ok((acting, target))
}

// =============================================================================
// Unit Tests
// =============================================================================
