//! # User Repository

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{Role, User};

const SELECT_USER: &str = r#"
    SELECT
        id, username, email, password_hash, full_name, role, is_active,
        created_at, updated_at
    FROM users
"#;

pub async fn insert(conn: &mut SqliteConnection, user: &User) -> DbResult<()> {
    debug!(id = %user.id, username = %user.username, role = %user.role, "Inserting user");

    sqlx::query(
        r#"
        INSERT INTO users (
            id, username, email, password_hash, full_name, role, is_active,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(user.role)
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &user.username),
        other => other,
    })?;

    Ok(())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(user)
}

/// Matches either the username or the email.
pub async fn find_by_identifier(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "{SELECT_USER} WHERE username = ?1 OR email = ?1 LIMIT 1"
    ))
    .bind(identifier)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

pub async fn count(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

pub async fn set_role(conn: &mut SqliteConnection, id: &str, role: Role) -> DbResult<User> {
    debug!(id = %id, role = %role, "Setting user role");

    let result = sqlx::query("UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(role)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("User", id));
    }

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("User", id))
}

pub async fn set_active(conn: &mut SqliteConnection, id: &str, active: bool) -> DbResult<User> {
    debug!(id = %id, active = active, "Setting user active flag");

    let result = sqlx::query("UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("User", id));
    }

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("User", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_user, test_db};

    #[tokio::test]
    async fn test_find_by_username_or_email() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let user = sample_user("picker", Role::Staff);
        insert(&mut conn, &user).await.unwrap();

        let by_name = find_by_identifier(&mut conn, "picker").await.unwrap();
        let by_email = find_by_identifier(&mut conn, "picker@example.com").await.unwrap();
        assert_eq!(by_name.as_ref().map(|u| &u.id), Some(&user.id));
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
        assert!(find_by_identifier(&mut conn, "nobody").await.unwrap().is_none());
        assert_eq!(count(&mut conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_role_round_trips_as_text() {
        let db = test_db().await;
        let user = sample_user("root", Role::SuperAdmin);
        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &user).await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
            .bind(&user.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(stored, "super_admin");

        let found = find_by_id(&mut conn, &user.id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::SuperAdmin);
        assert_eq!(found.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_set_role_and_active() {
        let db = test_db().await;
        let user = sample_user("picker", Role::Staff);
        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &user).await.unwrap();

        let promoted = set_role(&mut conn, &user.id, Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let disabled = set_active(&mut conn, &user.id, false).await.unwrap();
        assert!(!disabled.is_active);

        assert!(set_active(&mut conn, "missing", false).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &sample_user("picker", Role::Staff)).await.unwrap();

        let err = insert(&mut conn, &sample_user("picker", Role::Staff))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
