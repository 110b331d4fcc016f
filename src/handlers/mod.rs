pub mod about_handlers;
pub mod auth_handlers;
pub mod follow_handlers;
pub mod listing_handlers;
pub mod post_handlers;

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Serialize;

/// Upper bound for form bodies; post forms carry base64 images.
pub const MAX_FORM_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// Page context for a successfully rendered page.
pub(crate) fn render<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(message, data))
}

/// Form page shown again with its errors.
pub(crate) fn render_invalid<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        status: "error".to_string(),
        message: message.to_string(),
        data: Some(data),
    })
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

#[derive(Debug, serde::Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// Raw `page` query parameter. A malformed query string counts as absent.
pub(crate) fn page_param(req: &HttpRequest) -> Option<String> {
    web::Query::<PageQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().page)
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error("Page not found"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(MAX_FORM_BYTES))
        .service(listing_handlers::index)
        .service(listing_handlers::group_posts)
        .service(listing_handlers::follow_index)
        .service(follow_handlers::profile_follow)
        .service(follow_handlers::profile_unfollow)
        .service(listing_handlers::profile)
        .service(post_handlers::post_create_form)
        .service(post_handlers::post_create)
        .service(post_handlers::post_detail)
        .service(post_handlers::post_edit_form)
        .service(post_handlers::post_edit)
        .service(post_handlers::add_comment)
        .service(auth_handlers::signup_form)
        .service(auth_handlers::signup)
        .service(auth_handlers::login_form)
        .service(auth_handlers::login)
        .service(auth_handlers::logout)
        .service(auth_handlers::password_change_form)
        .service(auth_handlers::password_change)
        .service(auth_handlers::password_change_done)
        .service(about_handlers::author)
        .service(about_handlers::tech);
}
