use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::DbId;
use crate::core::helpers::{now, short_label};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: DbId,
    pub post_id: DbId,
    pub author_id: DbId,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_username: String,
}

impl Comment {
    pub fn label(&self) -> &str {
        short_label(&self.text)
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: DbId,
    pub author_id: DbId,
    pub text: String,
}

const SELECT: &str = "SELECT c.id, c.post_id, c.author_id, c.text, c.created, \
        u.username AS author_username \
     FROM comments c \
     JOIN users u ON u.id = c.author_id";

pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(pool: &SqlitePool, new: &NewComment) -> Result<Comment, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO comments (post_id, author_id, text, created) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(new.post_id)
        .bind(new.author_id)
        .bind(&new.text)
        .bind(now())
        .fetch_one(pool)
        .await?;

        let query = format!("{SELECT} WHERE c.id = ?");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Comments on a post, newest first.
    pub async fn list_for_post(pool: &SqlitePool, post_id: DbId) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!("{SELECT} WHERE c.post_id = ? ORDER BY c.created DESC, c.id DESC");
        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_post(pool: &SqlitePool, post_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
