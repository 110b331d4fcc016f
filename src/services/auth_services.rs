// src/services/auth_services.rs
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BlogError, BlogResult};
use crate::models::user::User;

pub const SESSION_COOKIE: &str = "session";

/// JWT claims stored in the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// subject / user id
    pub sub: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and checks session tokens, hashes and verifies passwords.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<String>, session_ttl: Duration) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn issue_token(&self, user: &User) -> BlogResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    /// Returns the user id and username carried by a valid, unexpired token.
    pub fn verify_token(&self, token: &str) -> BlogResult<(Uuid, String)> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|e| BlogError::Validation(format!("invalid subject: {}", e)))?;
        Ok((user_id, data.claims.username))
    }

    pub fn hash_password(&self, password: &str) -> BlogResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| BlogError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
