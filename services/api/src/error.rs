//! Custom error types for the API service

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can report to a client
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or blank input
    #[error("{0}")]
    Validation(String),

    /// Registration with an email that is already taken
    #[error("User already exists")]
    UserExists,

    /// Login identifier matched no account
    #[error("User not found")]
    UnknownLogin,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The addressed user does not exist
    #[error("User not found")]
    NotFound,

    #[error("File size should be less than or equal to the limit.")]
    FileTooLarge,

    #[error("Invalid file type. Only allowed types are specified.")]
    InvalidFileType,

    /// Unclassified failure; the message is generic, the cause is only logged
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        // Upload and server failures report under "error", the rest under "message".
        let body = match self {
            ApiError::FileTooLarge | ApiError::InvalidFileType | ApiError::Internal(_) => {
                json!({ "error": message })
            }
            _ => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::FileTooLarge
        } else {
            ApiError::Validation(format!("Malformed upload: {}", err.body_text()))
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        ApiError::Validation(err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::Validation(err.body_text())
    }
}

/// Log `err` and turn it into a generic internal error carrying `message`
pub fn internal<E: Display>(message: &'static str) -> impl FnOnce(E) -> ApiError {
    move |err| {
        error!("{}: {}", message, err);
        ApiError::Internal(message)
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
