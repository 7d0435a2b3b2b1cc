//! # Session Repository
//!
//! Sessions are looked up by token on every authenticated request. Rows
//! are never deleted: logout sets `revoked_at`, expiry is a timestamp
//! comparison done by the caller.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::Session;

pub async fn insert(conn: &mut SqliteConnection, session: &Session) -> DbResult<()> {
    debug!(id = %session.id, user_id = %session.user_id, "Inserting session");

    sqlx::query(
        r#"
        INSERT INTO sessions (
            id, user_id, token, created_at, expired_at, revoked_at,
            last_activity, ip_address, user_agent
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.token)
    .bind(session.created_at)
    .bind(session.expired_at)
    .bind(session.revoked_at)
    .bind(session.last_activity)
    .bind(&session.ip_address)
    .bind(&session.user_agent)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find_by_token(conn: &mut SqliteConnection, token: &str) -> DbResult<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT
            id, user_id, token, created_at, expired_at, revoked_at,
            last_activity, ip_address, user_agent
        FROM sessions
        WHERE token = ?1
        "#,
    )
    .bind(token)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(session)
}

/// Sets `revoked_at` unless already set. Returns whether the token exists.
pub async fn revoke(conn: &mut SqliteConnection, token: &str, at: DateTime<Utc>) -> DbResult<bool> {
    debug!("Revoking session");

    let result = sqlx::query(
        "UPDATE sessions SET revoked_at = COALESCE(revoked_at, ?1) WHERE token = ?2",
    )
    .bind(at)
    .bind(token)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn touch(conn: &mut SqliteConnection, token: &str, at: DateTime<Utc>) -> DbResult<()> {
    sqlx::query("UPDATE sessions SET last_activity = ?1 WHERE token = ?2")
        .bind(at)
        .bind(token)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::user;
    use crate::testing::{sample_user, test_db};
    use chrono::Duration;
    use stockroom_core::{ClientInfo, Role};

    #[tokio::test]
    async fn test_revocation_keeps_first_time() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let owner = sample_user("picker", Role::Staff);
        user::insert(&mut conn, &owner).await.unwrap();

        let now = Utc::now();
        let session = Session::issue(&owner.id, Duration::hours(24), ClientInfo::default(), now);
        insert(&mut conn, &session).await.unwrap();

        let first = now + Duration::minutes(1);
        assert!(revoke(&mut conn, &session.token, first).await.unwrap());
        assert!(revoke(&mut conn, &session.token, first + Duration::minutes(5)).await.unwrap());

        let stored = find_by_token(&mut conn, &session.token).await.unwrap().unwrap();
        assert_eq!(stored.revoked_at, Some(first));
        assert!(!stored.is_valid_at(now));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!revoke(&mut conn, "nope", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_session_requires_user() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let session = Session::issue("ghost", Duration::hours(1), ClientInfo::default(), Utc::now());

        assert!(insert(&mut conn, &session).await.is_err());
    }

    #[tokio::test]
    async fn test_touch_updates_last_activity() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let owner = sample_user("picker", Role::Staff);
        user::insert(&mut conn, &owner).await.unwrap();
        let now = Utc::now();
        let session = Session::issue(&owner.id, Duration::hours(1), ClientInfo::default(), now);
        insert(&mut conn, &session).await.unwrap();

        let later = now + Duration::minutes(10);
        touch(&mut conn, &session.token, later).await.unwrap();

        let stored = find_by_token(&mut conn, &session.token).await.unwrap().unwrap();
        assert_eq!(stored.last_activity, later);
    }
}
