use actix_web::{web, HttpResponse};

use crate::auth::MaybeUser;
use crate::config::POSTS_PER_PAGE;
use crate::core::errors::{AppError, AppResult};
use crate::core::query_params::PageParams;
use crate::models::{GroupRepo, PostFilter, PostRepo};
use crate::templates;
use crate::AppState;

pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let group = GroupRepo::find_by_slug(&state.pool, &path)
        .await?
        .ok_or(AppError::NotFound)?;
    let posts = PostRepo::page(
        &state.pool,
        PostFilter::Group(group.id),
        query.requested(),
        POSTS_PER_PAGE,
    )
    .await?;

    let html = templates::render_group(viewer.user(), &group, &posts)?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}
