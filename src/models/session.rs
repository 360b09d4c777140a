use chrono::Duration;
use sqlx::SqlitePool;

use super::{DbId, User};
use crate::core::helpers::{new_session_token, now};

pub struct SessionRepo;

impl SessionRepo {
    /// Starts a session for `user_id` and returns its token.
    pub async fn create(pool: &SqlitePool, user_id: DbId) -> Result<String, sqlx::Error> {
        let token = new_session_token();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(now())
            .execute(pool)
            .await?;
        Ok(token)
    }

    /// Resolves a token to its user, ignoring sessions older than `max_age_hours`.
    pub async fn find_user(
        pool: &SqlitePool,
        token: &str,
        max_age_hours: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        let not_before = now() - Duration::hours(max_age_hours);
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.password_hash, u.created_at \
             FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ? AND s.created_at >= ?",
        )
        .bind(token)
        .bind(not_before)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Removes sessions older than `max_age_hours`; returns how many were dropped.
    pub async fn purge_expired(pool: &SqlitePool, max_age_hours: i64) -> Result<u64, sqlx::Error> {
        let not_before = now() - Duration::hours(max_age_hours);
        let result = sqlx::query("DELETE FROM sessions WHERE created_at < ?")
            .bind(not_before)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
