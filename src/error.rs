use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{auth::service::AccountError, comments::service::CommentError};

#[derive(Debug)]
pub enum AppError {
    InternalServerError,
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
}

impl From<CommentError> for AppError {
    fn from(e: CommentError) -> Self {
        match e {
            CommentError::Validation(msg) => AppError::UnprocessableEntity(msg),
            CommentError::NotFound(msg) => AppError::NotFound(msg),
            CommentError::Conflict(msg) => {
                tracing::info!("rejected comment write: {msg}");
                AppError::Conflict(msg)
            }
            CommentError::Store(e) => {
                tracing::error!("Database error: {:?}", e);
                AppError::InternalServerError
            }
        }
    }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(msg) => AppError::UnprocessableEntity(msg),
            AccountError::InvalidCredentials => AppError::Unauthorized,
            AccountError::NotFound(msg) => AppError::NotFound(msg),
            AccountError::UsernameTaken => {
                AppError::Conflict("Username already exists".to_string())
            }
            AccountError::Store(e) => {
                tracing::error!("Database error: {:?}", e);
                AppError::InternalServerError
            }
            AccountError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                AppError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        // Same envelope as ApiResponse
        let body = Json(json!({
            "success": false,
            "message": error_message,
            "data": null
        }));

        (status, body).into_response()
    }
}
