use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::DbId;
use crate::core::helpers::{now, short_label};
use crate::core::paginator::{Page, Paginator};

/// A post joined with the names needed to display it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: DbId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: DbId,
    pub group_id: Option<DbId>,
    /// Path relative to the media directory; empty when the post has no image.
    pub image: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl Post {
    pub fn label(&self) -> &str {
        short_label(&self.text)
    }

    pub fn image(&self) -> Option<&str> {
        (!self.image.is_empty()).then_some(self.image.as_str())
    }

    pub fn author_display_name(&self) -> String {
        let full = format!("{} {}", self.author_first_name, self.author_last_name);
        let full = full.trim();
        if full.is_empty() {
            self.author_username.clone()
        } else {
            full.to_string()
        }
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: DbId,
    pub group_id: Option<DbId>,
    pub image: Option<String>,
}

/// Editable fields of an existing post. `image: None` keeps the current image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<DbId>,
    pub image: Option<String>,
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(DbId),
    Author(DbId),
    /// Posts by the authors the given user follows.
    FollowedBy(DbId),
}

impl PostFilter {
    fn where_clause(&self) -> (&'static str, Option<DbId>) {
        match *self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => ("WHERE p.group_id = ?", Some(id)),
            PostFilter::Author(id) => ("WHERE p.author_id = ?", Some(id)),
            PostFilter::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)",
                Some(id),
            ),
        }
    }
}

const SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.author_id, p.group_id, p.image, \
        u.username AS author_username, u.first_name AS author_first_name, \
        u.last_name AS author_last_name, g.slug AS group_slug, g.title AS group_title \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

/// Newest first, ties broken by author, then by insertion order.
const ORDER: &str = "ORDER BY p.pub_date DESC, p.author_id, p.id DESC";

pub struct PostRepo;

impl PostRepo {
    pub async fn create(pool: &SqlitePool, new: &NewPost) -> Result<Post, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new.text)
        .bind(now())
        .bind(new.author_id)
        .bind(new.group_id)
        .bind(new.image.as_deref().unwrap_or(""))
        .fetch_one(pool)
        .await?;

        Self::find(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies an edit; `pub_date` and `author_id` never change.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        changes: &PostChanges,
    ) -> Result<Option<Post>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image = COALESCE(?, image) WHERE id = ?",
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(changes.image.as_deref())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find(pool, id).await
    }

    pub async fn find(pool: &SqlitePool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("{SELECT} WHERE p.id = ?");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool, filter: PostFilter) -> Result<i64, sqlx::Error> {
        let (clause, arg) = filter.where_clause();
        let query = format!("SELECT COUNT(*) FROM posts p {clause}");
        let mut q = sqlx::query_as::<_, (i64,)>(&query);
        if let Some(arg) = arg {
            q = q.bind(arg);
        }
        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }

    pub async fn list(
        pool: &SqlitePool,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let (clause, arg) = filter.where_clause();
        let query = format!("{SELECT} {clause} {ORDER} LIMIT ? OFFSET ?");
        let mut q = sqlx::query_as::<_, Post>(&query);
        if let Some(arg) = arg {
            q = q.bind(arg);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// One page of `filter`, resolving `requested` the way [`Paginator`] does.
    pub async fn page(
        pool: &SqlitePool,
        filter: PostFilter,
        requested: Option<i64>,
        per_page: usize,
    ) -> Result<Page<Post>, sqlx::Error> {
        let total = Self::count(pool, filter).await?;
        let window = Paginator::new(total, per_page).resolve(requested);
        let items = Self::list(pool, filter, window.limit(), window.offset()).await?;
        Ok(window.into_page(items))
    }

    /// Maintenance only; handlers never delete posts directly.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
