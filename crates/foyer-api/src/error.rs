//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! HTTP mapping follows the documented contract: validation failures and
//! conflicts (duplicate email, duplicate check-in) both answer 400, with the
//! taxonomy class carried in the JSON body; authentication failures answer
//! 401 with a distinguished reason string; store failures answer 500 with a
//! generic message while the cause goes to the log.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("too many requests")]
  RateLimited,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Tag a core validation failure with the offending field.
  pub fn validation(field: &'static str, err: foyer_core::Error) -> Self {
    Self::Validation {
      field,
      message: err.to_string(),
    }
  }

  /// Classify a core-taxonomy failure. Domain outcomes keep a
  /// caller-facing message; plumbing failures are logged here and answered
  /// generically.
  pub fn from_core<E: Into<foyer_core::Error>>(err: E) -> Self {
    use foyer_core::Error as Core;
    match err.into() {
      Core::IdentityNotFound(id) => {
        Self::NotFound(format!("identity {id} not found"))
      }
      Core::EmailTaken(email) => {
        Self::Conflict(format!("{email} is already registered"))
      }
      Core::DuplicateVisit(_) => Self::Conflict(
        "already checked in moments ago; please wait a minute".to_string(),
      ),
      Core::EmailNotRegistered(_) => Self::Unauthorized(
        "no account registered for this email; register first".to_string(),
      ),
      Core::MissingCredential(_) => Self::Unauthorized(
        "no PIN is set for this account; ask the front desk to reset it"
          .to_string(),
      ),
      Core::PinMismatch => {
        Self::Unauthorized("incorrect PIN".to_string())
      }
      Core::Store(cause) => {
        tracing::error!(error = %cause, "store operation failed");
        Self::Store(cause)
      }
      other => {
        tracing::error!(error = %other, "unexpected store failure");
        Self::Store(Box::new(other))
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Validation { field, message } => (
        StatusCode::BAD_REQUEST,
        json!({ "error": message, "field": field }),
      ),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, json!({ "error": m }))
      }
      ApiError::Conflict(m) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": m, "kind": "conflict" }),
      ),
      ApiError::Unauthorized(m) => {
        (StatusCode::UNAUTHORIZED, json!({ "error": m }))
      }
      ApiError::RateLimited => (
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": "too many requests; slow down and try again" }),
      ),
      // Never expose the underlying cause to the caller.
      ApiError::Store(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "operation failed, please try again" }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
