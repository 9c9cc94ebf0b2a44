//! Password hashing and the bearer token guard.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use metrics::counter;
use tracing::debug;

use timetrack_core::repository::{PasswordEncoder, PasswordEncoderError};

use crate::application::user::{GetUserByApiTokenQuery, UserView};
use crate::application::ApplicationError;
use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Argon2id with the crate defaults, stored as a PHC string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordEncoder;

impl PasswordEncoder for Argon2PasswordEncoder {
    fn hash(&self, plain: &str) -> Result<String, PasswordEncoderError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordEncoderError(err.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordEncoderError> {
        let parsed = PasswordHash::new(hash).map_err(|err| PasswordEncoderError(err.to_string()))?;
        match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordEncoderError(err.to_string())),
        }
    }
}

/// The user owning the bearer token of the current request.
#[derive(Debug, Clone)]
pub struct LoggedUser(pub UserView);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn reject(reason: &'static str) -> ProblemResponse {
    counter!("auth_failures_total", "reason" => reason).increment(1);
    debug!(stage = "auth", reason, "request rejected");
    let problem_type = match reason {
        "missing_token" => "auth.errors.missing_token",
        _ => "auth.errors.invalid_token",
    };
    ProblemResponse::new(
        StatusCode::UNAUTHORIZED,
        problem_type,
        "a valid bearer token is required",
    )
}

#[async_trait]
impl FromRequestParts<AppState> for LoggedUser {
    type Rejection = ProblemResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| reject("missing_token"))?;

        let user = state
            .query_bus()
            .execute(GetUserByApiTokenQuery {
                api_token: token.to_string(),
            })
            .await
            .map_err(|err| match err {
                ApplicationError::Domain(_) => reject("invalid_token"),
                other => ProblemResponse::from_query(other),
            })?;

        Ok(Self(user))
    }
}
