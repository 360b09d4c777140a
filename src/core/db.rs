use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::core::helpers::hash_password;
use crate::models::{FollowRepo, GroupRepo, NewGroup, NewPost, NewUser, PostRepo, UserRepo};

/// Open the pool described by `settings` and apply pending migrations.
pub async fn setup_database(settings: &Settings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.database_url)?.foreign_keys(true);

    // An in-memory database lives as long as its single connection.
    let pool = if settings.database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(options).await?
    };

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(pool)
}

/// Demo accounts, a group and a few posts for a fresh install. Idempotent.
pub async fn init_demo_data(pool: &SqlitePool) -> anyhow::Result<()> {
    if UserRepo::find_by_username(pool, "leo").await?.is_some() {
        return Ok(());
    }

    let group = match GroupRepo::find_by_slug(pool, "classics").await? {
        Some(g) => g,
        None => {
            GroupRepo::create(
                pool,
                &NewGroup {
                    title: "Classics".to_string(),
                    slug: "classics".to_string(),
                    description: "Books everyone has meant to read.".to_string(),
                },
            )
            .await?
        }
    };

    let leo = UserRepo::create(
        pool,
        &NewUser {
            username: "leo".to_string(),
            first_name: "Leo".to_string(),
            last_name: "Tolstoy".to_string(),
            email: String::new(),
            password_hash: hash_password("leo-demo-password")?,
        },
    )
    .await?;

    let anna = UserRepo::create(
        pool,
        &NewUser {
            username: "anna".to_string(),
            first_name: "Anna".to_string(),
            last_name: String::new(),
            email: String::new(),
            password_hash: hash_password("anna-demo-password")?,
        },
    )
    .await?;

    let seeds = [
        (leo.id, Some(group.id), "War and Peace is underrated, whatever anyone says."),
        (leo.id, None, "Started a new draft this morning."),
        (anna.id, Some(group.id), "Reading group meets on Thursday."),
    ];
    for (author_id, group_id, text) in seeds {
        PostRepo::create(
            pool,
            &NewPost {
                text: text.to_string(),
                author_id,
                group_id,
                image: None,
            },
        )
        .await?;
    }

    FollowRepo::create(pool, anna.id, leo.id).await?;

    tracing::info!("demo data created");
    Ok(())
}
