// src/handlers/listing_handlers.rs
use actix_web::{get, http::header::ContentType, web, HttpRequest, HttpResponse};
use log::debug;

use crate::dtos::pages::{FollowPage, GroupPage, IndexPage, ProfilePage};
use crate::errors::{BlogError, BlogResult};
use crate::handlers::{page_param, render, ApiResponse};
use crate::middleware::auth_extractor::{AuthenticatedUser, CurrentUser};
use crate::models::post::{PostFilter, PostView};
use crate::models::user::UserPublic;
use crate::repositories::blog_store::BlogStore;
use crate::services::pagination::{Page, PageWindow, POSTS_PER_PAGE};
use crate::AppState;

/// Count the filtered posts, then fetch only the requested window.
pub(crate) async fn load_page(
    store: &dyn BlogStore,
    filter: PostFilter,
    raw_page: Option<&str>,
) -> BlogResult<Page<PostView>> {
    let count = store.count_posts(filter).await?;
    let window = PageWindow::resolve(count, raw_page, POSTS_PER_PAGE);
    let posts = store.list_posts(filter, window.offset(), window.limit()).await?;
    let page = Page::new(posts, window);
    debug!("{:?}: page {}/{} with {} posts", filter, page.number, page.num_pages, page.len());
    Ok(page)
}

/// GET /
/// Whole response is cached per resolved page number, so stray query
/// parameters share an entry. Writes do not invalidate it.
#[get("/")]
pub async fn index(req: HttpRequest, app_state: web::Data<AppState>) -> BlogResult<HttpResponse> {
    let count = app_state.store.count_posts(PostFilter::All).await?;
    let page = page_param(&req);
    let window = PageWindow::resolve(count, page.as_deref(), POSTS_PER_PAGE);
    let cache_key = format!("{}?page={}", req.path(), window.number);

    if let Some(body) = app_state.page_cache.get(&cache_key) {
        debug!("index {} served from page cache", cache_key);
        return Ok(HttpResponse::Ok().content_type(ContentType::json()).body(body));
    }

    let posts = app_state
        .store
        .list_posts(PostFilter::All, window.offset(), window.limit())
        .await?;
    let page_obj = Page::new(posts, window);
    let body = serde_json::to_vec(&ApiResponse::success(
        "Posts retrieved successfully",
        IndexPage { page_obj },
    ))?;
    app_state.page_cache.set(cache_key, body.clone());

    Ok(HttpResponse::Ok().content_type(ContentType::json()).body(body))
}

/// GET /group/{slug}/
#[get("/group/{slug}/")]
pub async fn group_posts(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> BlogResult<HttpResponse> {
    let slug = path.into_inner();
    let group = app_state
        .store
        .find_group_by_slug(&slug)
        .await?
        .ok_or(BlogError::NotFound("group"))?;

    let page = page_param(&req);
    let page_obj = load_page(app_state.store.as_ref(), PostFilter::Group(group.id), page.as_deref()).await?;

    Ok(render("Group posts retrieved successfully", GroupPage { group, page_obj }))
}

/// GET /profile/{username}/
#[get("/profile/{username}/")]
pub async fn profile(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    viewer: CurrentUser,
    path: web::Path<String>,
) -> BlogResult<HttpResponse> {
    let username = path.into_inner();
    let author = app_state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or(BlogError::NotFound("user"))?;

    let page = page_param(&req);
    let page_obj = load_page(app_state.store.as_ref(), PostFilter::Author(author.id), page.as_deref()).await?;

    // anonymous viewers never hit the follow table
    let following = match viewer.actor() {
        Some(actor) => app_state.store.is_following(actor.user_id, author.id).await?,
        None => false,
    };

    Ok(render(
        "Profile retrieved successfully",
        ProfilePage {
            author: UserPublic::from(&author),
            page_obj,
            following,
        },
    ))
}

/// GET /follow/
/// Posts by every author the current user follows.
#[get("/follow/")]
pub async fn follow_index(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> BlogResult<HttpResponse> {
    let page = page_param(&req);
    let page_obj = load_page(
        app_state.store.as_ref(),
        PostFilter::FollowedBy(user.user_id),
        page.as_deref(),
    )
    .await?;

    Ok(render("Feed retrieved successfully", FollowPage { page_obj }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::repositories::blog_store::BlogStore;
    use crate::test_support::{test_app, Fixture};

    #[actix_web::test]
    async fn index_paginates_thirteen_posts() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        for i in 0..13 {
            fx.post(&leo, &format!("post {}", i), None).await;
        }
        let app = test_app!(fx).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let page = &body["data"]["page_obj"];
        assert_eq!(page["object_list"].as_array().unwrap().len(), 10);
        assert_eq!(page["object_list"][0]["text"], "post 12");
        assert_eq!(page["has_next"], true);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=2").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["page_obj"]["object_list"].as_array().unwrap().len(), 3);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=banana").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["page_obj"]["number"], 1);
    }

    #[actix_web::test]
    async fn index_is_cached_until_cleared() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        let post = fx.post(&leo, "soon gone", None).await;
        let app = test_app!(fx).await;

        let first: Value = test::read_body_json(
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await,
        )
        .await;
        assert_eq!(first["data"]["page_obj"]["count"], 1);

        fx.store.delete_post(post.id).await.unwrap();

        let stale: Value = test::read_body_json(
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await,
        )
        .await;
        assert_eq!(stale["data"]["page_obj"]["count"], 1);

        fx.state.page_cache.clear();

        let fresh: Value = test::read_body_json(
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await,
        )
        .await;
        assert_eq!(fresh["data"]["page_obj"]["count"], 0);
    }

    #[actix_web::test]
    async fn stray_query_params_share_cache_entry() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        fx.post(&leo, "only post", None).await;
        let app = test_app!(fx).await;

        for uri in ["/", "/?junk=1", "/?junk=2&page=1", "/?page=banana", "/?page=99"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(fx.state.page_cache.len(), 1);
    }

    #[actix_web::test]
    async fn group_listing_filters_and_404s() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        let cats = fx.group("cats").await;
        fx.post(&leo, "in group", Some(cats.id)).await;
        fx.post(&leo, "no group", None).await;
        let app = test_app!(fx).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/group/cats/").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        let list = body["data"]["page_obj"]["object_list"].as_array().unwrap().clone();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["text"], "in group");
        assert_eq!(body["data"]["group"]["slug"], "cats");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/group/dogs/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn deleted_group_leaves_posts_in_index() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        let cats = fx.group("cats").await;
        fx.post(&leo, "in group", Some(cats.id)).await;
        fx.store.delete_group(cats.id).await.unwrap();
        let app = test_app!(fx).await;

        let body: Value = test::read_body_json(
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await,
        )
        .await;
        let post = &body["data"]["page_obj"]["object_list"][0];
        assert_eq!(post["text"], "in group");
        assert!(post["group"].is_null());
    }

    #[actix_web::test]
    async fn profile_shows_follow_state() {
        let fx = Fixture::new();
        let leo = fx.user("leo").await;
        let ann = fx.user("ann").await;
        fx.post(&leo, "by leo", None).await;
        fx.post(&ann, "by ann", None).await;
        fx.store.follow(ann.id, leo.id).await.unwrap();
        let app = test_app!(fx).await;

        let anon: Value = test::read_body_json(
            test::call_service(&app, test::TestRequest::get().uri("/profile/leo/").to_request()).await,
        )
        .await;
        assert_eq!(anon["data"]["following"], false);
        assert_eq!(anon["data"]["author"]["username"], "leo");
        assert_eq!(anon["data"]["page_obj"]["count"], 1);

        let req = test::TestRequest::get()
            .uri("/profile/leo/")
            .cookie(fx.cookie(&ann))
            .to_request();
        let as_ann: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(as_ann["data"]["following"], true);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/profile/nobody/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn feed_requires_login() {
        let fx = Fixture::new();
        let app = test_app!(fx).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/follow/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get("location").unwrap(),
            "/auth/login/?next=/follow/"
        );
    }

    #[actix_web::test]
    async fn new_post_reaches_followers_only() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let follower = fx.user("follower").await;
        let stranger = fx.user("stranger").await;
        fx.store.follow(follower.id, author.id).await.unwrap();
        fx.post(&author, "fresh news", None).await;
        let app = test_app!(fx).await;

        let req = test::TestRequest::get().uri("/follow/").cookie(fx.cookie(&follower)).to_request();
        let feed: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(feed["data"]["page_obj"]["object_list"][0]["text"], "fresh news");

        let req = test::TestRequest::get().uri("/follow/").cookie(fx.cookie(&stranger)).to_request();
        let feed: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(feed["data"]["page_obj"]["count"], 0);
    }
}
