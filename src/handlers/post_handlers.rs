// src/handlers/post_handlers.rs
use actix_web::{get, post, web, HttpResponse};
use log::{debug, info, warn};

use crate::dtos::pages::{PostDetailPage, PostFormPage};
use crate::dtos::post_dtos::{CleanPost, CommentForm, FormErrors, PostForm, INVALID_CHOICE};
use crate::errors::{BlogError, BlogResult};
use crate::handlers::{post_url, profile_url, redirect, render, render_invalid};
use crate::middleware::auth_extractor::{AuthenticatedUser, CurrentUser};
use crate::models::comment::NewComment;
use crate::models::post::{NewPost, PostChanges, PostFilter, PostView};
use crate::AppState;

async fn find_post(app_state: &AppState, post_id: i64) -> BlogResult<PostView> {
    app_state
        .store
        .find_post(post_id)
        .await?
        .ok_or(BlogError::NotFound("post"))
}

/// Field checks plus the lookup of the chosen group.
async fn clean_post_form(app_state: &AppState, form: &PostForm) -> BlogResult<Result<CleanPost, FormErrors>> {
    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => return Ok(Err(errors)),
    };
    if let Some(group_id) = clean.group_id {
        if app_state.store.find_group_by_id(group_id).await?.is_none() {
            let mut errors = FormErrors::default();
            errors.add("group", INVALID_CHOICE);
            return Ok(Err(errors));
        }
    }
    Ok(Ok(clean))
}

async fn form_page(
    app_state: &AppState,
    form: PostForm,
    errors: FormErrors,
    edit_id: Option<i64>,
) -> BlogResult<PostFormPage> {
    Ok(PostFormPage {
        form,
        errors,
        groups: app_state.store.list_groups().await?,
        is_edit: edit_id.is_some(),
        id: edit_id,
    })
}

/// GET /posts/{id}/
#[get("/posts/{post_id}/")]
pub async fn post_detail(
    app_state: web::Data<AppState>,
    viewer: CurrentUser,
    path: web::Path<i64>,
) -> BlogResult<HttpResponse> {
    let post = find_post(&app_state, path.into_inner()).await?;
    let count = app_state.store.count_posts(PostFilter::Author(post.author.id)).await?;
    let comments = app_state.store.list_comments(post.id).await?;
    let is_author = viewer.actor().is_some_and(|actor| post.is_authored_by(actor.user_id));

    Ok(render(
        "Post retrieved successfully",
        PostDetailPage {
            post,
            count,
            is_author,
            form: CommentForm::default(),
            comments,
        },
    ))
}

/// GET /create/
#[get("/create/")]
pub async fn post_create_form(
    app_state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> BlogResult<HttpResponse> {
    let page = form_page(&app_state, PostForm::default(), FormErrors::default(), None).await?;
    Ok(render("New post", page))
}

/// POST /create/
#[post("/create/")]
pub async fn post_create(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<PostForm>,
) -> BlogResult<HttpResponse> {
    let form = form.into_inner();
    let clean = match clean_post_form(&app_state, &form).await? {
        Ok(clean) => clean,
        Err(errors) => {
            debug!("post form from {} rejected: {:?}", user.username, errors);
            let page = form_page(&app_state, form, errors, None).await?;
            return Ok(render_invalid("Please correct the errors below", page));
        }
    };

    let image = match clean.image {
        Some(checked) => Some(app_state.media.save(checked).await?),
        None => None,
    };

    let created = app_state
        .store
        .create_post(NewPost {
            text: clean.text,
            author_id: user.user_id,
            group_id: clean.group_id,
            image: image.clone(),
        })
        .await;

    match created {
        Ok(post) => {
            info!("post {} created by {}", post.id, user.username);
            Ok(redirect(&profile_url(&user.username)))
        }
        Err(e) => {
            if let Some(name) = image {
                app_state.media.discard(&name).await;
            }
            Err(e)
        }
    }
}

/// GET /posts/{id}/edit/
#[get("/posts/{post_id}/edit/")]
pub async fn post_edit_form(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> BlogResult<HttpResponse> {
    let post = find_post(&app_state, path.into_inner()).await?;
    if !post.is_authored_by(user.user_id) {
        return Ok(redirect(&post_url(post.id)));
    }

    let page = form_page(&app_state, PostForm::from_post(&post), FormErrors::default(), Some(post.id)).await?;
    Ok(render("Edit post", page))
}

/// POST /posts/{id}/edit/
/// Non-authors are bounced to the detail page without any change.
#[post("/posts/{post_id}/edit/")]
pub async fn post_edit(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> BlogResult<HttpResponse> {
    let post = find_post(&app_state, path.into_inner()).await?;
    if !post.is_authored_by(user.user_id) {
        warn!("{} tried to edit post {} owned by {}", user.username, post.id, post.author.username);
        return Ok(redirect(&post_url(post.id)));
    }

    let form = form.into_inner();
    let clean = match clean_post_form(&app_state, &form).await? {
        Ok(clean) => clean,
        Err(errors) => {
            let page = form_page(&app_state, form, errors, Some(post.id)).await?;
            return Ok(render_invalid("Please correct the errors below", page));
        }
    };

    let image = match clean.image {
        Some(checked) => Some(app_state.media.save(checked).await?),
        None => None,
    };

    let updated = app_state
        .store
        .update_post(
            post.id,
            PostChanges {
                text: clean.text,
                group_id: clean.group_id,
                image: image.clone(),
            },
        )
        .await;

    if let Err(e) = updated {
        if let Some(name) = image {
            app_state.media.discard(&name).await;
        }
        return Err(e);
    }

    // the replaced file is no longer referenced by any post
    if let (Some(new), Some(old)) = (&image, &post.image) {
        if new != old {
            app_state.media.discard(old).await;
        }
    }

    info!("post {} edited by {}", post.id, user.username);
    Ok(redirect(&post_url(post.id)))
}

/// POST /posts/{id}/comment/
/// Always ends on the detail page. An empty or unreadable submission is
/// dropped silently.
#[post("/posts/{post_id}/comment/")]
pub async fn add_comment(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    form: Result<web::Form<CommentForm>, actix_web::Error>,
) -> BlogResult<HttpResponse> {
    let post = find_post(&app_state, path.into_inner()).await?;

    let form = form.map(web::Form::into_inner).unwrap_or_else(|e| {
        debug!("unreadable comment body from {}: {}", user.username, e);
        CommentForm::default()
    });

    match form.clean() {
        Some(text) => {
            let comment = app_state
                .store
                .create_comment(NewComment {
                    post_id: post.id,
                    author_id: user.user_id,
                    text,
                })
                .await?;
            info!("comment {} on post {} by {}", comment.id, post.id, user.username);
        }
        None => debug!("empty comment from {} on post {} ignored", user.username, post.id),
    }

    Ok(redirect(&post_url(post.id)))
}
