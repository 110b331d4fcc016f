// src/test_support.rs - shared fixtures for handler and service tests
use actix_web::{cookie::Cookie, dev::ServiceResponse, http::header, web};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::models::group::{Group, NewGroup};
use crate::models::post::{NewPost, Post};
use crate::models::user::{NewUser, User};
use crate::repositories::blog_store::BlogStore;
use crate::repositories::memory_store::MemoryStore;
use crate::services::auth_services::{AuthService, SESSION_COOKIE};
use crate::services::media_storage::MediaStorage;
use crate::services::page_cache::PageCache;
use crate::AppState;

/// 2x1 GIF, base64 encoded.
pub const SMALL_GIF: &str = "R0lGODlhAgABAIAAAAAAAP///yH5BAAAAAAALAAAAAACAAEAAAICDAoAOw==";

const TEST_SECRET: &str = "test-secret-not-for-production";

/// Hash that never verifies; fixtures that log in use `user_with_password`.
const UNUSABLE_PASSWORD: &str = "!";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<AppState>,
    pub auth: web::Data<AuthService>,
    // dropped with the fixture
    _media_dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let media_dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::new());
        let state = web::Data::new(AppState {
            store: store.clone(),
            page_cache: Arc::new(PageCache::new(Duration::from_secs(20))),
            media: MediaStorage::new(media_dir.path()),
        });
        let auth = web::Data::new(AuthService::new(TEST_SECRET, chrono::Duration::hours(1)));
        Self {
            store,
            state,
            auth,
            _media_dir: media_dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.insert_user(username, UNUSABLE_PASSWORD.to_string()).await
    }

    pub async fn user_with_password(&self, username: &str, password: &str) -> User {
        let hash = self.auth.hash_password(password).unwrap();
        self.insert_user(username, hash).await
    }

    async fn insert_user(&self, username: &str, password_hash: String) -> User {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash,
            })
            .await
            .unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: format!("Group {}", slug),
                slug: slug.to_string(),
                description: format!("All about {}", slug),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group_id: Option<i64>) -> Post {
        self.store
            .create_post(NewPost {
                text: text.to_string(),
                author_id: author.id,
                group_id,
                image: None,
            })
            .await
            .unwrap()
    }

    /// Session cookie for `user`, as set by a successful login.
    pub fn cookie(&self, user: &User) -> Cookie<'static> {
        Cookie::new(SESSION_COOKIE, self.auth.issue_token(user).unwrap())
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Service with the full route table, wired to a fixture's state.
macro_rules! test_app {
    ($fx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($fx.state.clone())
                .app_data($fx.auth.clone())
                .configure(crate::handlers::configure)
                .default_service(actix_web::web::to(crate::handlers::not_found)),
        )
    };
}

pub(crate) use test_app;
