use actix_web::web::{self, Bytes};
use actix_web::{HttpRequest, HttpResponse};

use crate::auth::{can_edit, CurrentUser, MaybeUser};
use crate::config::{INDEX_CACHE_PREFIX, POSTS_PER_PAGE};
use crate::core::cache::PageCache;
use crate::core::errors::{AppError, AppResult};
use crate::core::helpers::redirect;
use crate::core::query_params::PageParams;
use crate::forms::{CommentForm, FormErrors, PostForm, RawForm, Submission, ValidPost};
use crate::media::{remove_post_image, save_post_image};
use crate::models::{
    CommentRepo, DbId, GroupRepo, NewPost, Post, PostChanges, PostFilter, PostRepo, User,
};
use crate::templates;
use crate::AppState;

fn html(body: impl Into<Bytes>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body.into())
}

/// Look up a post by id, or 404.
pub async fn find_post(state: &AppState, post_id: DbId) -> AppResult<Post> {
    PostRepo::find(&state.pool, post_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Front page. Rendered pages are cached per page number and viewer for the
/// cache TTL, so posts written in the meantime show up only once the entry expires.
pub async fn index(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    // Unusable page numbers render page 1, so they share its entry.
    let requested = query.requested().filter(|n| *n >= 1).unwrap_or(1);
    let page_tag = requested.to_string();
    let viewer_tag = viewer.cache_tag();
    let key = PageCache::key(INDEX_CACHE_PREFIX, &[page_tag.as_str(), viewer_tag.as_str()]);

    if let Some(body) = state.cache.get(&key) {
        return Ok(html(body));
    }

    let posts = PostRepo::page(&state.pool, PostFilter::All, Some(requested), POSTS_PER_PAGE).await?;
    let body = Bytes::from(templates::render_index(viewer.user(), &posts)?);
    state.cache.insert(key, body.clone());
    Ok(html(body))
}

pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    path: web::Path<DbId>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    let comments = CommentRepo::list_for_post(&state.pool, post.id).await?;
    let author_post_count = PostRepo::count(&state.pool, PostFilter::Author(post.author_id)).await?;

    let body = templates::render_post_detail(
        viewer.user(),
        &post,
        author_post_count,
        &comments,
        &CommentForm::default(),
        &FormErrors::default(),
    )?;
    Ok(html(body))
}

pub async fn create_post_page(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    let groups = GroupRepo::list(&state.pool).await?;
    let body = templates::render_post_form(
        Some(&user.0),
        &PostForm::default(),
        &FormErrors::default(),
        &groups,
        None,
    )?;
    Ok(html(body))
}

async fn store_image(state: &AppState, valid: &ValidPost) -> AppResult<Option<String>> {
    match &valid.image {
        Some(image) => Ok(Some(save_post_image(&state.settings.media_dir, image).await?)),
        None => Ok(None),
    }
}

async fn discard_image(state: &AppState, image: Option<&str>) {
    if let Some(path) = image {
        remove_post_image(&state.settings.media_dir, path).await;
    }
}

pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: HttpRequest,
    body: Bytes,
) -> AppResult<HttpResponse> {
    let CurrentUser(user) = user;
    let raw = RawForm::from_request(&req, body).await?;
    let form = PostForm::bind(&raw);
    let groups = GroupRepo::list(&state.pool).await?;

    match form.validate(&groups) {
        Ok(valid) => {
            let image = store_image(&state, &valid).await?;
            let created = PostRepo::create(
                &state.pool,
                &NewPost {
                    text: valid.text,
                    author_id: user.id,
                    group_id: valid.group_id,
                    image: image.clone(),
                },
            )
            .await;
            let post = match created {
                Ok(post) => post,
                Err(e) => {
                    discard_image(&state, image.as_deref()).await;
                    return Err(e.into());
                }
            };
            tracing::info!(post_id = post.id, author_id = user.id, "post created");
            Ok(redirect(&profile_url(&user)))
        }
        Err(errors) => {
            let body = templates::render_post_form(Some(&user), &form, &errors, &groups, None)?;
            Ok(html(body))
        }
    }
}

pub async fn edit_post_page(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<DbId>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if !can_edit(&user.0, &post) {
        return Ok(redirect(&detail_url(post.id)));
    }

    let groups = GroupRepo::list(&state.pool).await?;
    let body = templates::render_post_form(
        Some(&user.0),
        &PostForm::from_post(&post),
        &FormErrors::default(),
        &groups,
        Some(&post),
    )?;
    Ok(html(body))
}

pub async fn edit_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<DbId>,
    req: HttpRequest,
    body: Bytes,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if !can_edit(&user.0, &post) {
        tracing::debug!(post_id = post.id, user_id = user.0.id, "edit refused, not the author");
        return Ok(redirect(&detail_url(post.id)));
    }

    let raw = RawForm::from_request(&req, body).await?;
    let form = PostForm::bind(&raw);
    let groups = GroupRepo::list(&state.pool).await?;

    match form.validate(&groups) {
        Ok(valid) => {
            let image = store_image(&state, &valid).await?;
            let changes = PostChanges {
                text: valid.text,
                group_id: valid.group_id,
                image: image.clone(),
            };
            match PostRepo::update(&state.pool, post.id, &changes).await {
                // A replaced image is no longer referenced by anything.
                Ok(Some(_)) if image.is_some() => discard_image(&state, post.image()).await,
                Ok(Some(_)) => {}
                Ok(None) => {
                    discard_image(&state, image.as_deref()).await;
                    return Err(AppError::NotFound);
                }
                Err(e) => {
                    discard_image(&state, image.as_deref()).await;
                    return Err(e.into());
                }
            }
            tracing::info!(post_id = post.id, "post edited");
            Ok(redirect(&detail_url(post.id)))
        }
        Err(errors) => {
            let body = templates::render_post_form(Some(&user.0), &form, &errors, &groups, Some(&post))?;
            Ok(html(body))
        }
    }
}

pub fn detail_url(post_id: DbId) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(user: &User) -> String {
    format!("/profile/{}/", urlencoding::encode(&user.username))
}
