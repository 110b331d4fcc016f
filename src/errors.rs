use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::handlers::ApiResponse;

pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("login required for {next}")]
    Unauthenticated { next: String },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing error: {0}")]
    Hashing(String),
}

pub type BlogResult<T> = Result<T, BlogError>;

impl BlogError {
    /// Path separators stay readable in `next`, everything else is escaped.
    pub fn login_redirect_url(next: &str) -> String {
        let encoded = urlencoding::encode(next).replace("%2F", "/");
        format!("{}?next={}", LOGIN_URL, encoded)
    }
}

impl ResponseError for BlogError {
    fn status_code(&self) -> StatusCode {
        match self {
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::Unauthenticated { .. } => StatusCode::FOUND,
            BlogError::Validation(_) | BlogError::Conflict(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            BlogError::Unauthenticated { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, Self::login_redirect_url(next)))
                .finish(),
            BlogError::NotFound(_) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Page not found")),
            BlogError::Validation(msg) | BlogError::Conflict(msg) => {
                HttpResponse::BadRequest().json(ApiResponse::<()>::error(msg.clone()))
            }
            other => {
                error!("request failed: {}", other);
                HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Internal server error"))
            }
        }
    }
}
