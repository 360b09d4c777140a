use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::DbId;
use crate::core::helpers::now;

/// `user` subscribes to the posts of `author`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Follow {
    pub id: DbId,
    pub user_id: DbId,
    pub author_id: DbId,
    pub created: DateTime<Utc>,
}

const COLUMNS: &str = "id, user_id, author_id, created";

pub struct FollowRepo;

impl FollowRepo {
    /// Inserts the pair. Returns `None` when it already exists, including when a
    /// concurrent request inserted it first.
    pub async fn create(
        pool: &SqlitePool,
        user_id: DbId,
        author_id: DbId,
    ) -> Result<Option<Follow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO follows (user_id, author_id, created) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, author_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Follow>(&query)
            .bind(user_id)
            .bind(author_id)
            .bind(now())
            .fetch_optional(pool)
            .await
    }

    pub async fn find(
        pool: &SqlitePool,
        user_id: DbId,
        author_id: DbId,
    ) -> Result<Option<Follow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM follows WHERE user_id = ? AND author_id = ?");
        sqlx::query_as::<_, Follow>(&query)
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &SqlitePool, user_id: DbId, author_id: DbId) -> Result<bool, sqlx::Error> {
        Ok(Self::find(pool, user_id, author_id).await?.is_some())
    }

    /// Returns the number of removed rows (0 when the pair did not exist).
    pub async fn delete(pool: &SqlitePool, user_id: DbId, author_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn count_followers(pool: &SqlitePool, author_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn count_following(pool: &SqlitePool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
