//! API error type
//!
//! Every handler returns `Result<HttpResponse, ApiError>`. The error renders
//! itself as the `{success: false, error}` envelope with the status mapped
//! from its category.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::core::AuthRejection;
use crate::models::ValidationErrors;
use crate::plugins::spotify::CatalogError;

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Field-level validation failures
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Malformed request outside a specific field
    #[error("{0}")]
    BadRequest(String),

    /// Authentication failed
    #[error(transparent)]
    Auth(#[from] AuthRejection),

    /// Wrong email or password on login
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Caller is authenticated but not allowed to touch the resource
    #[error("{0}")]
    Forbidden(String),

    /// Missing document by identifier
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Spotify token exchange or query failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Storage failure other than a uniqueness conflict
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Anything else
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let target = db_err
                    .message()
                    .strip_prefix("UNIQUE constraint failed: ")
                    .unwrap_or("value")
                    .to_string();
                return ApiError::BadRequest(format!("{} already exists", target));
            }
        }
        ApiError::Database(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(rejection) => rejection.status_code(),
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Catalog(CatalogError::ArtistNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Catalog(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "error": self.to_string(),
                "fields": errors,
            }),
            _ => json!({
                "success": false,
                "error": self.to_string(),
            }),
        };

        HttpResponse::build(status).json(body)
    }
}
