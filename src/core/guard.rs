//! Bearer-token authentication
//!
//! A request moves through extract, verify and resolve in order. The first
//! failing step rejects the request; there is no partial authentication.

use actix_web::http::StatusCode;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::JwtSettings;
use crate::db::UserTable;
use crate::models::User;
use crate::utils::auth::verify_jwt;

/// Why a request could not be authenticated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("not authorized, no token")]
    MissingToken,

    /// Signature or expiry check failed; the reason is only logged
    #[error("not authorized, token failed")]
    InvalidToken(String),

    #[error("not authorized, user no longer exists")]
    UnknownSubject,

    /// Looking the subject up failed
    #[error("could not load user: {0}")]
    Storage(String),
}

impl AuthRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthRejection> {
    header
        .map(str::trim)
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthRejection::MissingToken)
}

/// Run the whole pipeline and return the authenticated user
pub async fn authenticate(
    pool: &SqlitePool,
    jwt: &JwtSettings,
    header: Option<&str>,
) -> Result<User, AuthRejection> {
    let token = extract_bearer(header)?;

    let claims = verify_jwt(token, &jwt.secret)
        .map_err(|e| AuthRejection::InvalidToken(e.to_string()))?;

    UserTable::get_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthRejection::Storage(e.to_string()))?
        .ok_or(AuthRejection::UnknownSubject)
}
