use sqlx::SqlitePool;

use super::DbId;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Group {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

const COLUMNS: &str = "id, title, slug, description";

pub struct GroupRepo;

impl GroupRepo {
    pub async fn create(pool: &SqlitePool, new: &NewGroup) -> Result<Group, sqlx::Error> {
        let query = format!(
            "INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(&new.title)
            .bind(&new.slug)
            .bind(&new.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM post_groups WHERE slug = ?");
        sqlx::query_as::<_, Group>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// All groups, for the group picker on the post form.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM post_groups ORDER BY title, id");
        sqlx::query_as::<_, Group>(&query).fetch_all(pool).await
    }

    /// Posts of a deleted group keep existing with no group.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM post_groups WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
