use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::web::{self, Bytes};
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;

use crate::config::SESSION_COOKIE;
use crate::core::errors::{AppError, AppResult};
use crate::core::helpers::{redirect, safe_next, verify_password};
use crate::core::query_params::NextParams;
use crate::forms::{FormErrors, LoginForm, RawForm, Submission};
use crate::models::{Post, SessionRepo, User, UserRepo};
use crate::templates;
use crate::AppState;

/// The logged-in user. Extracting it from an anonymous request fails with
/// [`AppError::LoginRequired`], which redirects to the login page.
pub struct CurrentUser(pub User);

/// The logged-in user, if any.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn cache_tag(&self) -> String {
        self.0
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| "anon".to_string())
    }
}

fn app_state(req: &HttpRequest) -> AppResult<web::Data<AppState>> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("application state is not registered")))
}

/// Resolve the session cookie of `req` to a user.
pub async fn session_user(req: &HttpRequest) -> AppResult<Option<User>> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };
    let state = app_state(req)?;
    let user = SessionRepo::find_user(&state.pool, cookie.value(), state.settings.session_hours).await?;
    Ok(user)
}

fn requested_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match session_user(&req).await? {
                Some(user) => Ok(CurrentUser(user)),
                None => Err(AppError::LoginRequired {
                    next: requested_path(&req),
                }),
            }
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(MaybeUser(session_user(&req).await?)) })
    }
}

/// Only the author may change a post.
pub fn can_edit(viewer: &User, post: &Post) -> bool {
    viewer.id == post.author_id
}

pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Start a session for `user` and redirect to `next`.
pub async fn start_session(state: &AppState, user: &User, next: &str) -> AppResult<HttpResponse> {
    let token = SessionRepo::create(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, username = %user.username, "session started");
    let mut resp = redirect(next);
    resp.add_cookie(&session_cookie(&token))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid session cookie: {}", e)))?;
    Ok(resp)
}

// === Handlers ===

pub async fn login_page(query: web::Query<NextParams>) -> AppResult<HttpResponse> {
    let next = safe_next(query.next.as_deref());
    let html = templates::render_login(&LoginForm::default(), &FormErrors::default(), next)?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

pub async fn login_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Bytes,
) -> AppResult<HttpResponse> {
    let raw = RawForm::from_request(&req, body).await?;
    let form = LoginForm::bind(&raw);
    let next_field = raw.field("next");
    let next = safe_next(Some(next_field.as_str()));

    let errors = match form.validate(&()) {
        Ok((username, password)) => {
            if let Some(user) = UserRepo::find_by_username(&state.pool, &username).await? {
                if verify_password(&password, &user.password_hash) {
                    return start_session(&state, &user, next).await;
                }
            }
            tracing::info!(username = %username, "failed login");
            let mut errors = FormErrors::default();
            errors.add_non_field(
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            errors
        }
        Err(errors) => errors,
    };

    let html = templates::render_login(&form, &errors, next)?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

pub async fn logout_user(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        SessionRepo::delete(&state.pool, cookie.value()).await?;
    }

    let html = templates::render_logged_out()?;
    let mut resp = HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html);
    resp.add_cookie(&expired_session_cookie())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid session cookie: {}", e)))?;
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn post_by(author_id: i64) -> Post {
        Post {
            id: 1,
            text: "text".into(),
            pub_date: Utc::now(),
            author_id,
            group_id: None,
            image: String::new(),
            author_username: format!("user{}", author_id),
            author_first_name: String::new(),
            author_last_name: String::new(),
            group_slug: None,
            group_title: None,
        }
    }

    #[test]
    fn only_the_author_can_edit() {
        assert!(can_edit(&user(1), &post_by(1)));
        assert!(!can_edit(&user(2), &post_by(1)));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
