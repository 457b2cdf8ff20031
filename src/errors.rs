use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{error, warn};
use thiserror::Error;

use crate::dtos::api_response::ApiResponse;
use crate::repositories::postgrest::RepoError;
use crate::services::identity_service::IdentityError;

/// Single error path for every handler: each variant maps to one HTTP status
/// and is rendered as the JSON envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),
    #[error("{0}")]
    Internal(String),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Validation(format!("Invalid multipart payload: {}", e))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Repo(e) if e.is_unique_violation() => StatusCode::CONFLICT,
            ApiError::Identity(IdentityError::UnknownIdentity) => StatusCode::UNAUTHORIZED,
            ApiError::Repo(_) | ApiError::Identity(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            _ if status.is_server_error() => {
                error!("{}", self);
                "Internal server error".to_string()
            }
            ApiError::Repo(_) => {
                warn!("{}", self);
                "Resource already exists".to_string()
            }
            ApiError::Identity(_) => {
                warn!("{}", self);
                "Unknown identity".to_string()
            }
            _ => {
                warn!("{} {}", status.as_u16(), self);
                self.to_string()
            }
        };

        HttpResponse::build(status).json(ApiResponse::error(message))
    }
}
