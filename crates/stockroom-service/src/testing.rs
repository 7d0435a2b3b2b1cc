//! Fixtures shared by the unit tests of this crate.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use stockroom_core::{ClientInfo, Item, Role, RolePolicy, User, DEFAULT_UNIT};
use stockroom_db::{
    AccountStore, CatalogStore, Database, DbConfig, MemoryStore, TransactionManager, UnitOfWork,
};

use crate::auth::{hash_password, Actor, AuthService};

/// Placeholder hash for users that never log in.
const UNUSABLE_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA";

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) fn memory_auth() -> (AuthService<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    let auth = AuthService::new(store.clone(), Arc::new(RolePolicy), Duration::hours(24));
    (auth, store)
}

pub(crate) async fn sqlite_auth() -> (AuthService<Database>, Database) {
    let db = test_db().await;
    let auth = AuthService::new(db.clone(), Arc::new(RolePolicy), Duration::hours(24));
    (auth, db)
}

fn user(username: &str, role: Role, password_hash: String) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash,
        full_name: username.to_string(),
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A user whose password really verifies.
pub(crate) async fn user_with_password(username: &str, role: Role, password: &str) -> User {
    let hash = hash_password(password).await.expect("hash");
    user(username, role, hash)
}

/// Stores a user that can log in with `password`.
pub(crate) async fn insert_user<T: TransactionManager>(
    store: &T,
    username: &str,
    role: Role,
    password: &str,
) -> User {
    let user = user_with_password(username, role, password).await;
    let mut scope = store.begin().await.expect("begin");
    scope.insert_user(&user).await.expect("insert user");
    scope.commit().await.expect("commit");
    user
}

/// Stores a user without a usable password and returns them as an actor
/// with a live session.
pub(crate) async fn seed_actor<T: TransactionManager>(store: &T, username: &str, role: Role) -> Actor {
    let user = user(username, role, UNUSABLE_HASH.to_string());
    let mut scope = store.begin().await.expect("begin");
    scope.insert_user(&user).await.expect("insert user");
    scope.commit().await.expect("commit");
    actor_for(store, &user).await
}

/// Opens a one-hour session for a stored user and returns the actor it
/// resolves to.
pub(crate) async fn actor_for<T: TransactionManager>(store: &T, user: &User) -> Actor {
    let mut scope = store.begin().await.expect("begin");
    let session = scope
        .create_session(&user.id, Duration::hours(1), ClientInfo::default(), Utc::now())
        .await
        .expect("create session");
    scope.commit().await.expect("commit");
    Actor {
        user_id: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
        session_token: session.token,
        session_expires_at: session.expired_at,
    }
}

pub(crate) async fn seed_item<T: TransactionManager>(
    store: &T,
    sku: &str,
    price_cents: i64,
    stock: i64,
) -> Item {
    let now = Utc::now();
    let item = Item {
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
        minimum_stock: 2,
        is_active: true,
        created_by: None,
        created_at: now,
        updated_at: now,
    };
    let mut scope = store.begin().await.expect("begin");
    scope.insert_item(&item).await.expect("insert item");
    scope.commit().await.expect("commit");
    item
}

pub(crate) async fn load_item<T: TransactionManager>(store: &T, id: &str) -> Item {
    let mut scope = store.begin().await.expect("begin");
    let item = scope.find_item(id).await.expect("find").expect("item exists");
    scope.rollback().await.expect("rollback");
    item
}
