// src/handlers/follow_handlers.rs
use actix_web::{get, web, HttpResponse};
use log::{debug, info};

use crate::errors::{BlogError, BlogResult};
use crate::handlers::{profile_url, redirect};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::user::User;
use crate::AppState;

async fn find_author(app_state: &AppState, username: &str) -> BlogResult<User> {
    app_state
        .store
        .find_user_by_username(username)
        .await?
        .ok_or(BlogError::NotFound("user"))
}

/// GET /profile/{username}/follow/
/// Idempotent. Following yourself just sends you back to the index.
#[get("/profile/{username}/follow/")]
pub async fn profile_follow(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> BlogResult<HttpResponse> {
    let author = find_author(&app_state, &path.into_inner()).await?;

    if author.id == user.user_id {
        debug!("{} tried to follow themselves", user.username);
        return Ok(redirect("/"));
    }

    if app_state.store.follow(user.user_id, author.id).await? {
        info!("{} now follows {}", user.username, author.username);
    }
    Ok(redirect(&profile_url(&author.username)))
}

/// GET /profile/{username}/unfollow/
#[get("/profile/{username}/unfollow/")]
pub async fn profile_unfollow(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> BlogResult<HttpResponse> {
    let author = find_author(&app_state, &path.into_inner()).await?;

    if app_state.store.unfollow(user.user_id, author.id).await? {
        info!("{} unfollowed {}", user.username, author.username);
    }
    Ok(redirect(&profile_url(&author.username)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use crate::repositories::blog_store::BlogStore;
    use crate::test_support::{location, test_app, Fixture};

    #[actix_web::test]
    async fn follow_twice_then_unfollow_restores_count() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        let ann = fx.user("ann").await;
        let app = test_app!(fx).await;
        let before = fx.store.count_follows().await.unwrap();

        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/profile/leo/follow/")
                .cookie(fx.cookie(&ann))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(location(&resp), "/profile/leo/");
        }
        assert_eq!(fx.store.count_follows().await.unwrap(), before + 1);
        assert!(fx.store.is_following(ann.id, leo.id).await.unwrap());

        let req = test::TestRequest::get()
            .uri("/profile/leo/unfollow/")
            .cookie(fx.cookie(&ann))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "/profile/leo/");
        assert_eq!(fx.store.count_follows().await.unwrap(), before);

        // unfollowing again is not an error
        let req = test::TestRequest::get()
            .uri("/profile/leo/unfollow/")
            .cookie(fx.cookie(&ann))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    }

    #[actix_web::test]
    async fn self_follow_goes_to_index() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        let app = test_app!(fx).await;

        let req = test::TestRequest::get()
            .uri("/profile/leo/follow/")
            .cookie(fx.cookie(&leo))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "/");
        assert_eq!(fx.store.count_follows().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn follow_needs_login_and_existing_author() {
        let fx = Fixture::new();
        let ann = fx.user("ann").await;
        fx.user("leo").await;
        let app = test_app!(fx).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/profile/leo/follow/").to_request(),
        )
        .await;
        assert_eq!(location(&resp), "/auth/login/?next=/profile/leo/follow/");

        let req = test::TestRequest::get()
            .uri("/profile/ghost/follow/")
            .cookie(fx.cookie(&ann))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(fx.store.count_follows().await.unwrap(), 0);
    }
}
