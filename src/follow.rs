use actix_web::{web, HttpResponse};

use crate::auth::CurrentUser;
use crate::config::POSTS_PER_PAGE;
use crate::core::errors::AppResult;
use crate::core::helpers::redirect;
use crate::core::query_params::PageParams;
use crate::models::{FollowRepo, PostFilter, PostRepo};
use crate::posts::profile_url;
use crate::templates;
use crate::users::find_author;
use crate::AppState;

/// Feed of posts by the authors the viewer follows.
pub async fn follow_index(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let posts = PostRepo::page(
        &state.pool,
        PostFilter::FollowedBy(user.0.id),
        query.requested(),
        POSTS_PER_PAGE,
    )
    .await?;

    let html = templates::render_follow_index(Some(&user.0), &posts)?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

/// Following yourself, or someone twice, is a silent no-op.
pub async fn profile_follow(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state.pool, &path).await?;
    let CurrentUser(user) = user;

    if user.id != author.id {
        if let Some(follow) = FollowRepo::create(&state.pool, user.id, author.id).await? {
            tracing::info!(follow_id = follow.id, user_id = user.id, author_id = author.id, "follow added");
        }
    }

    Ok(redirect(&profile_url(&author)))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state.pool, &path).await?;

    let removed = FollowRepo::delete(&state.pool, user.0.id, author.id).await?;
    if removed > 0 {
        tracing::info!(user_id = user.0.id, author_id = author.id, "follow removed");
    }

    Ok(redirect(&profile_url(&author)))
}
