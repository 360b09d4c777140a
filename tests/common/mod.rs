#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::web;
use tempfile::TempDir;

use gazette::auth::session_cookie;
use gazette::config::Settings;
use gazette::core::db::setup_database;
use gazette::core::helpers::hash_password;
use gazette::models::{
    Group, GroupRepo, NewGroup, NewPost, NewUser, Post, PostRepo, SessionRepo, User, UserRepo,
};
use gazette::AppState;

pub const PASSWORD: &str = "correct-horse-battery";

/// A GIF small enough to inline, 2x1 pixels.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

/// Fresh in-memory database and a throwaway media directory.
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn test_state() -> (web::Data<AppState>, TempDir) {
    let media = TempDir::new().expect("Failed to create media dir");
    let settings = Settings {
        media_dir: media.path().to_path_buf(),
        ..Settings::default()
    };
    let pool = setup_database(&settings)
        .await
        .expect("Failed to set up database");
    (web::Data::new(AppState::new(pool, settings)), media)
}

pub async fn create_user(state: &AppState, username: &str) -> User {
    UserRepo::create(
        &state.pool,
        &NewUser {
            username: username.to_string(),
            password_hash: hash_password(PASSWORD).expect("Failed to hash password"),
            ..NewUser::default()
        },
    )
    .await
    .expect("Failed to create user")
}

pub async fn login_cookie(state: &AppState, user: &User) -> Cookie<'static> {
    let token = SessionRepo::create(&state.pool, user.id)
        .await
        .expect("Failed to create session");
    session_cookie(&token)
}

pub async fn create_group(state: &AppState, title: &str, slug: &str) -> Group {
    GroupRepo::create(
        &state.pool,
        &NewGroup {
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("All about {}", title),
        },
    )
    .await
    .expect("Failed to create group")
}

pub async fn create_post(state: &AppState, author: &User, group: Option<&Group>, text: &str) -> Post {
    PostRepo::create(
        &state.pool,
        &NewPost {
            text: text.to_string(),
            author_id: author.id,
            group_id: group.map(|g| g.id),
            image: None,
        },
    )
    .await
    .expect("Failed to create post")
}

/// Number of post cards on a rendered page.
pub fn post_cards(html: &str) -> usize {
    html.matches(r#"<article class="post">"#).count()
}

/// A multipart body with text fields and one file part.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/gif\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
