// src/handlers/auth_handlers.rs
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{get, http::header, post, route, web, HttpResponse};
use log::{debug, info};

use crate::dtos::auth::{safe_next, LoginForm, NextQuery, PasswordChangeForm, SignupForm, SignupFormOut};
use crate::dtos::pages::{FormPage, LoginPage, SignupPage, StaticPage};
use crate::dtos::post_dtos::FormErrors;
use crate::errors::{BlogError, BlogResult};
use crate::handlers::{render, render_invalid, ApiResponse};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::user::{NewUser, User};
use crate::services::auth_services::{AuthService, SESSION_COOKIE};
use crate::AppState;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const PASSWORD_CHANGE_DONE_URL: &str = "/auth/password_change/done/";

fn session_cookie(svc: &AuthService, user: &User) -> BlogResult<Cookie<'static>> {
    let token = svc.issue_token(user)?;
    Ok(Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(svc.session_ttl().num_seconds()))
        .finish())
}

/// Redirect that also signs the user in.
fn redirect_signed_in(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .cookie(cookie)
        .finish()
}

/// GET /auth/signup/
#[get("/auth/signup/")]
pub async fn signup_form() -> HttpResponse {
    render(
        "Sign up",
        SignupPage {
            form: SignupFormOut::default(),
            errors: FormErrors::default(),
        },
    )
}

/// POST /auth/signup/
/// Creates the account, signs it in and goes to the index.
#[post("/auth/signup/")]
pub async fn signup(
    app_state: web::Data<AppState>,
    svc: web::Data<AuthService>,
    form: web::Form<SignupForm>,
) -> BlogResult<HttpResponse> {
    let (username, email) = match form.clean() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(render_invalid(
                "Please correct the errors below",
                SignupPage { form: form.echo(), errors },
            ));
        }
    };

    let password_hash = svc.hash_password(&form.password1)?;
    let created = app_state
        .store
        .create_user(NewUser { username, email, password_hash })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(BlogError::Conflict(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            return Ok(render_invalid(
                "Please correct the errors below",
                SignupPage { form: form.echo(), errors },
            ));
        }
        Err(e) => return Err(e),
    };

    info!("new account {}", user.username);
    Ok(redirect_signed_in("/", session_cookie(&svc, &user)?))
}

/// GET /auth/login/
#[get("/auth/login/")]
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    render(
        "Log in",
        LoginPage {
            username: String::new(),
            next: query.into_inner().next,
            errors: FormErrors::default(),
        },
    )
}

/// POST /auth/login/
#[post("/auth/login/")]
pub async fn login(
    app_state: web::Data<AppState>,
    svc: web::Data<AuthService>,
    form: web::Form<LoginForm>,
) -> BlogResult<HttpResponse> {
    let form = form.into_inner();
    let user = app_state.store.find_user_by_username(form.username.trim()).await?;

    let user = match user {
        Some(user) if svc.verify_password(&form.password, &user.password_hash) => user,
        _ => {
            debug!("failed login for {:?}", form.username);
            let mut errors = FormErrors::default();
            errors.add("__all__", BAD_CREDENTIALS);
            return Ok(render_invalid(
                "Please correct the errors below",
                LoginPage {
                    username: form.username,
                    next: form.next,
                    errors,
                },
            ));
        }
    };

    let target = safe_next(form.next.as_deref()).unwrap_or_else(|| "/".to_string());
    info!("{} logged in", user.username);
    Ok(redirect_signed_in(&target, session_cookie(&svc, &user)?))
}

/// GET|POST /auth/logout/
#[route("/auth/logout/", method = "GET", method = "POST")]
pub async fn logout() -> HttpResponse {
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();

    HttpResponse::Ok().cookie(removal).json(ApiResponse::success(
        "Logged out",
        StaticPage {
            template: "users/logged_out.html",
            title: "You have been logged out",
        },
    ))
}

/// GET /auth/password_change/
#[get("/auth/password_change/")]
pub async fn password_change_form(_user: AuthenticatedUser) -> HttpResponse {
    render("Change password", FormPage { errors: FormErrors::default() })
}

/// POST /auth/password_change/
/// Re-issues the session so the user stays signed in.
#[post("/auth/password_change/")]
pub async fn password_change(
    app_state: web::Data<AppState>,
    svc: web::Data<AuthService>,
    actor: AuthenticatedUser,
    form: web::Form<PasswordChangeForm>,
) -> BlogResult<HttpResponse> {
    let mut errors = match form.clean() {
        Ok(_) => FormErrors::default(),
        Err(errors) => errors,
    };

    let user = app_state
        .store
        .find_user_by_id(actor.user_id)
        .await?
        .ok_or(BlogError::NotFound("user"))?;

    if !form.old_password.is_empty() && !svc.verify_password(&form.old_password, &user.password_hash) {
        errors.add("old_password", "Your old password was entered incorrectly. Please enter it again.");
    }
    if !errors.is_empty() {
        return Ok(render_invalid("Please correct the errors below", FormPage { errors }));
    }

    let password_hash = svc.hash_password(&form.new_password1)?;
    app_state.store.update_password(user.id, &password_hash).await?;

    info!("{} changed their password", user.username);
    Ok(redirect_signed_in(PASSWORD_CHANGE_DONE_URL, session_cookie(&svc, &user)?))
}

/// GET /auth/password_change/done/
#[get("/auth/password_change/done/")]
pub async fn password_change_done(_user: AuthenticatedUser) -> HttpResponse {
    render(
        "Password changed",
        StaticPage {
            template: "users/password_change_done.html",
            title: "Your password was changed",
        },
    )
}
