use actix_web::web::{self, Bytes};
use actix_web::{HttpRequest, HttpResponse};

use crate::auth::CurrentUser;
use crate::core::errors::AppResult;
use crate::core::helpers::redirect;
use crate::forms::{CommentForm, RawForm, Submission};
use crate::models::{CommentRepo, DbId, NewComment};
use crate::posts::{detail_url, find_post};
use crate::AppState;

/// Attach a comment to a post. Invalid submissions are dropped; the reader is
/// sent back to the post either way.
pub async fn add_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<DbId>,
    req: HttpRequest,
    body: Bytes,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    let raw = RawForm::from_request(&req, body).await?;

    if let Ok(text) = CommentForm::bind(&raw).validate(&()) {
        let comment = CommentRepo::create(
            &state.pool,
            &NewComment {
                post_id: post.id,
                author_id: user.0.id,
                text,
            },
        )
        .await?;
        tracing::info!(comment_id = comment.id, post_id = post.id, "comment added");
    }

    Ok(redirect(&detail_url(post.id)))
}
