use crate::db_helpers::get_user_by_id;
use crate::errors::RequestError;
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

const SESSION_EXPIRY_DURATION: time::Duration = time::Duration::days(90);

/// Name of the session cookie the external auth provider sets and
/// `POST /logout` clears.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

#[derive(Debug)]
pub struct AuthUser {
    pub id: i64,
    pub token: String,
}

#[derive(Debug)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

/// Resolves the caller's identity from the `Authorization: Token <jwt>`
/// header or, failing that, the session cookie. An absent credential is not
/// an error; a malformed or expired one is.
#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        if let Some(header) = parts.headers.get(header::AUTHORIZATION) {
            let header = header
                .to_str()
                .map_err(|_| RequestError::NotAuthorized("Invalid token"))?;
            let token = header
                .strip_prefix("Token ")
                .ok_or(RequestError::NotAuthorized("Invalid token"))?;
            let id = verify_session_token(token)?;
            return Ok(MaybeUser(Some(AuthUser {
                id,
                token: token.to_string(),
            })));
        }

        let session = parts
            .headers
            .get_all(header::COOKIE)
            .into_iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(cookie::Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == SESSION_COOKIE);

        match session {
            Some(cookie) => {
                let id = verify_session_token(cookie.value())?;
                Ok(MaybeUser(Some(AuthUser {
                    id,
                    token: cookie.value().to_string(),
                })))
            }
            None => Ok(MaybeUser(None)),
        }
    }
}

/// Signs a session token for the given user id. The external auth provider
/// shares `JWT_SECRET` and issues the same tokens after its own login flow;
/// this service only needs to mint them in tests.
pub fn issue_session_token(id: i64) -> Result<String> {
    let jwt_secret = std::env::var("JWT_SECRET").context("Failed to get JWT_SECRET")?;
    let expiry_date = OffsetDateTime::now_utc() + SESSION_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to sign session token")
}

pub fn verify_session_token(token: &str) -> Result<i64, RequestError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| RequestError::ServerError)?;
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|_| RequestError::NotAuthorized("Invalid token"))?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token expired"));
    }
    Ok(claim.id)
}

/// Cookie that expires the session immediately, for `POST /logout`.
pub fn clear_session_cookie() -> cookie::Cookie<'static> {
    cookie::Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}

pub fn require_user(user: &MaybeUser) -> Result<&AuthUser, RequestError> {
    user.0
        .as_ref()
        .ok_or(RequestError::NotAuthorized("Authentication required"))
}

/// Loads the caller's row and checks the admin role. Anonymous callers are
/// rejected as unauthorized, authenticated non-admins as forbidden.
pub async fn require_admin(pool: &SqlitePool, user: &MaybeUser) -> Result<User, RequestError> {
    let auth = require_user(user)?;
    let user = get_user_by_id(pool, auth.id)
        .await?
        .ok_or(RequestError::NotAuthorized("Authentication required"))?;
    if user.role != UserRole::Admin {
        return Err(RequestError::Forbidden("Admin access required"));
    }
    Ok(user)
}
