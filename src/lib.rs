use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use sqlx::SqlitePool;

pub mod auth;
pub mod comments;
pub mod config;
pub mod core;
pub mod follow;
pub mod forms;
pub mod groups;
pub mod media;
pub mod models;
pub mod posts;
pub mod static_server;
pub mod templates;
pub mod users;

use crate::config::Settings;
use crate::core::cache::PageCache;
use crate::core::errors::{AppError, AppResult};

/// Everything a handler needs, shared across workers.
pub struct AppState {
    pub pool: SqlitePool,
    pub cache: PageCache,
    pub settings: Settings,
}

impl AppState {
    pub fn new(pool: SqlitePool, settings: Settings) -> Self {
        Self {
            pool,
            cache: PageCache::new(settings.index_cache_ttl),
            settings,
        }
    }
}

/// Register every route of the site.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(groups::group_posts))
        .route("/profile/{username}/", web::get().to(users::profile))
        .route("/profile/{username}/follow/", web::get().to(follow::profile_follow))
        .route("/profile/{username}/unfollow/", web::get().to(follow::profile_unfollow))
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::edit_post_page))
                .route(web::post().to(posts::edit_post)),
        )
        .route("/posts/{post_id}/comment/", web::post().to(comments::add_comment))
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::create_post_page))
                .route(web::post().to(posts::create_post)),
        )
        .route("/follow/", web::get().to(follow::follow_index))
        .service(
            web::resource("/auth/signup/")
                .route(web::get().to(users::signup_page))
                .route(web::post().to(users::create_user)),
        )
        .service(
            web::resource("/auth/login/")
                .route(web::get().to(auth::login_page))
                .route(web::post().to(auth::login_user)),
        )
        .service(
            web::resource("/auth/logout/")
                .route(web::get().to(auth::logout_user))
                .route(web::post().to(auth::logout_user)),
        )
        .route("/media/{path:.*}", web::get().to(media::serve_media))
        .route("/static/{path:.*}", web::get().to(static_server::serve_static));
}

async fn not_found() -> AppResult<actix_web::HttpResponse> {
    Err(AppError::NotFound)
}

/// The full application around `state`, ready for `HttpServer` or `actix_web::test`.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let payload_limit = state.settings.max_upload_bytes;
    App::new()
        .app_data(state)
        .app_data(web::PayloadConfig::new(payload_limit))
        .configure(configure)
        .default_service(web::to(not_found))
}
