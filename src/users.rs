use actix_web::web::{self, Bytes};
use actix_web::{HttpRequest, HttpResponse};
use sqlx::SqlitePool;

use crate::auth::{start_session, MaybeUser};
use crate::config::POSTS_PER_PAGE;
use crate::core::errors::{AppError, AppResult};
use crate::core::helpers::hash_password;
use crate::core::query_params::PageParams;
use crate::forms::{FormErrors, RawForm, SignupForm, Submission};
use crate::models::{FollowRepo, NewUser, PostFilter, PostRepo, User, UserRepo};
use crate::templates::{self, ProfileStats};
use crate::AppState;

/// Look up an author by username, or 404.
pub async fn find_author(pool: &SqlitePool, username: &str) -> AppResult<User> {
    UserRepo::find_by_username(pool, username)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn signup_page() -> AppResult<HttpResponse> {
    let html = templates::render_signup(&SignupForm::default(), &FormErrors::default())?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

pub async fn create_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Bytes,
) -> AppResult<HttpResponse> {
    let raw = RawForm::from_request(&req, body).await?;
    let form = SignupForm::bind(&raw);

    let errors = match form.validate(&()) {
        Ok(valid) => {
            let new_user = NewUser {
                username: valid.username,
                first_name: valid.first_name,
                last_name: valid.last_name,
                email: valid.email,
                password_hash: hash_password(&valid.password)?,
            };
            // The unique index on `username` decides, so simultaneous signups
            // for one name cannot both succeed.
            match UserRepo::create(&state.pool, &new_user).await {
                Ok(user) => {
                    tracing::info!(user_id = user.id, username = %user.username, "user registered");
                    return start_session(&state, &user, "/").await;
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    tracing::debug!(username = %new_user.username, "username already taken");
                    let mut errors = FormErrors::default();
                    errors.add("username", "A user with that username already exists.");
                    errors
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    let html = templates::render_signup(&form, &errors)?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

pub async fn profile(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state.pool, &path).await?;
    let filter = PostFilter::Author(author.id);
    let posts = PostRepo::page(&state.pool, filter, query.requested(), POSTS_PER_PAGE).await?;

    let viewer_follows = match viewer.user() {
        Some(v) => FollowRepo::exists(&state.pool, v.id, author.id).await?,
        None => false,
    };
    let stats = ProfileStats {
        post_count: posts.total,
        followers: FollowRepo::count_followers(&state.pool, author.id).await?,
        following: FollowRepo::count_following(&state.pool, author.id).await?,
        viewer_follows,
    };

    let html = templates::render_profile(viewer.user(), &author, &stats, &posts)?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}
