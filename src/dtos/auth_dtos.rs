use actix_web::http::Uri;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::dtos::post_dtos::{FormErrors, REQUIRED};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]{1,150}$").expect("username pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern"));

pub const MIN_PASSWORD_LEN: usize = 8;

fn looks_like_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Shared password rules for signup and password change.
fn check_new_password(errors: &mut FormErrors, field: &'static str, password: &str, confirmation: &str) {
    if password.is_empty() {
        errors.add(field, REQUIRED);
        return;
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("This password is too short. It must contain at least {} characters.", MIN_PASSWORD_LEN),
        );
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "This password is entirely numeric.");
    }
    if password != confirmation {
        errors.add(field, "The two password fields didn't match.");
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// What the signup page echoes back. Passwords are never sent back.
#[derive(Debug, Default, Serialize)]
pub struct SignupFormOut {
    pub username: String,
    pub email: String,
}

impl SignupForm {
    pub fn clean(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if !USERNAME_RE.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !looks_like_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        check_new_password(&mut errors, "password2", &self.password1, &self.password2);

        if errors.is_empty() {
            Ok((username, email))
        } else {
            Err(errors)
        }
    }

    pub fn echo(&self) -> SignupFormOut {
        SignupFormOut {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
///
/// Browsers drop tabs and newlines from a `Location`, so `/\t/host` would turn
/// into `//host`; any whitespace or control character disqualifies the value.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if !next.starts_with('/') || next.starts_with("//") || next.contains('\\') {
        return None;
    }
    if next.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return None;
    }
    // must be origin-form: a path and query, no scheme or authority
    let uri: Uri = next.parse().ok()?;
    let origin_form = uri.scheme().is_none() && uri.authority().is_none() && uri.path().starts_with('/');
    origin_form.then(|| next.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    /// Field checks only; the old password is verified by the handler.
    pub fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        if self.old_password.is_empty() {
            errors.add("old_password", REQUIRED);
        }
        check_new_password(&mut errors, "new_password2", &self.new_password1, &self.new_password2);
        if errors.is_empty() {
            Ok(self.new_password1.clone())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, p1: &str, p2: &str) -> SignupForm {
        SignupForm {
            username: username.into(),
            email: email.into(),
            password1: p1.into(),
            password2: p2.into(),
        }
    }

    #[test]
    fn valid_signup() {
        let (username, email) = signup("leo.t", "Leo@Example.com", "s3cret-pass", "s3cret-pass")
            .clean()
            .unwrap();
        assert_eq!(username, "leo.t");
        assert_eq!(email, "leo@example.com");
    }

    #[test]
    fn signup_field_errors() {
        let errors = signup("bad name!", "nope", "123", "124").clean().unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert!(errors.has("password2"));
    }

    #[test]
    fn numeric_passwords_are_rejected() {
        let errors = signup("leo", "leo@example.com", "1234567890", "1234567890").clean().unwrap_err();
        assert!(errors.has("password2"));
    }

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/create/")).as_deref(), Some("/create/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("/\t/evil.example/")), None);
        assert_eq!(safe_next(Some("/\n/evil.example/")), None);
        assert_eq!(safe_next(Some("/ /evil.example/")), None);
        assert_eq!(safe_next(Some("/\\evil.example/")), None);
        assert_eq!(safe_next(Some("/follow/?page=2")).as_deref(), Some("/follow/?page=2"));
        assert_eq!(safe_next(Some("https://evil.example/")), None);
        assert_eq!(safe_next(None), None);
    }
}
