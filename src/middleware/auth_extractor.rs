// src/middleware/auth_extractor.rs
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::{debug, error};
use uuid::Uuid;

use crate::errors::BlogError;
use crate::services::auth_services::{AuthService, SESSION_COOKIE};

/// Identity of the user making the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: Uuid,
    pub username: String,
}

/// Optional identity for public pages. Never rejects a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Actor>);

impl CurrentUser {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

/// Required identity. Anonymous requests are sent to the login page with the
/// current path as `next`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Actor);

impl std::ops::Deref for AuthenticatedUser {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}

/// Session token from the cookie, falling back to a bearer header.
fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    let auth_header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

fn resolve_actor(req: &HttpRequest) -> Option<Actor> {
    let token = session_token(req)?;
    let Some(auth) = req.app_data::<web::Data<AuthService>>() else {
        error!("AuthService is not registered as app data");
        return None;
    };
    match auth.verify_token(&token) {
        Ok((user_id, username)) => Some(Actor { user_id, username }),
        Err(e) => {
            debug!("ignoring session token: {}", e);
            None
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = BlogError;
    type Future = Ready<Result<CurrentUser, BlogError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(CurrentUser(resolve_actor(req))))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = BlogError;
    type Future = Ready<Result<AuthenticatedUser, BlogError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match resolve_actor(req) {
            Some(actor) => ready(Ok(AuthenticatedUser(actor))),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| "/".to_string());
                ready(Err(BlogError::Unauthenticated { next }))
            }
        }
    }
}
