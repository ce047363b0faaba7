//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every service operation returns one of its closed set of variants, and the variants
//! are translated into HTTP responses only here, at the outermost boundary.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return it
//! directly. `From` implementations exist for the module-level error types
//! (`StoreError`, `TokenError`, `MailError`) and for `validator::ValidationErrors` and
//! `bcrypt::BcryptError`, allowing for easy conversion using the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::mail::MailError;
use crate::store::StoreError;
use crate::validation::{self, FieldErrors};

/// Message returned to clients for every unanticipated failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Field-level validation failure (HTTP 400 with a field → messages map).
    ValidationFailed(FieldErrors),
    /// The request body could not be read at all (HTTP 400).
    BadRequest(String),
    /// An account with the same email already exists (HTTP 409).
    Conflict(String),
    /// The owner already has a task with this title (HTTP 400).
    DuplicateTitle,
    /// An update carried no change to the stored task (HTTP 400).
    NoChange,
    /// A list filter could not be parsed (HTTP 400).
    InvalidFilter(String),
    /// A reset token did not match any account (HTTP 400).
    InvalidToken(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// Valid credentials for an account that is not verified yet (HTTP 403).
    Forbidden(String),
    /// The resource does not exist or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// Store or infrastructure failure (HTTP 500).
    /// The detail is logged but never sent to the client.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationFailed(fields) => {
                write!(f, "Validation failed on {} field(s)", fields.len())
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::DuplicateTitle => write!(f, "A task with that title already exists"),
            AppError::NoChange => write!(f, "No changes detected"),
            AppError::InvalidFilter(msg) => write!(f, "Invalid filter parameter: {}", msg),
            AppError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed(_)
            | AppError::BadRequest(_)
            | AppError::DuplicateTitle
            | AppError::NoChange
            | AppError::InvalidFilter(_)
            | AppError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationFailed(fields) => json!({
                "error": "Validation failed",
                "details": fields
            }),
            AppError::DuplicateTitle => json!({
                "error": "A task with that title already exists"
            }),
            AppError::NoChange => json!({ "error": "No changes detected" }),
            AppError::InvalidFilter(_) => json!({ "error": "Invalid filter parameter" }),
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                json!({ "error": INTERNAL_ERROR_MESSAGE })
            }
            AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidToken(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => json!({ "error": msg }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Converts `StoreError` into `AppError`.
///
/// Only the missing-row case has a domain meaning on its own. Constraint violations
/// reach this conversion only when a service did not anticipate them, so they are
/// internal failures like any other backend error.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::ValidationFailed(validation::field_messages(&errors))
    }
}

/// A token that fails verification is an authentication failure; failing to
/// mint one is ours.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Signing(_) => AppError::Internal(error.to_string()),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<MailError> for AppError {
    fn from(error: MailError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(format!("password hashing failed: {}", error))
    }
}
