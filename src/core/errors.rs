use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::config::LOGIN_URL;
use crate::templates;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Login required to access {next}")]
    LoginRequired { next: String },

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// Target of the redirect sent to anonymous visitors of protected routes.
pub fn login_redirect_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, urlencoding::encode(next))
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::LoginRequired { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, login_redirect_url(next)))
                .finish(),
            AppError::NotFound => error_page(StatusCode::NOT_FOUND, "Page not found"),
            AppError::BadRequest(msg) => error_page(StatusCode::BAD_REQUEST, msg),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
            AppError::Io(e) => {
                tracing::error!(error = %e, "i/o error");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> HttpResponse {
    let body = templates::render_error(status.as_u16(), message)
        .unwrap_or_else(|_| format!("{} {}", status.as_u16(), message));
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}
