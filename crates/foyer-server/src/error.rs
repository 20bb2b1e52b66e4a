//! Error types and axum `IntoResponse` implementation for the admin layer.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Classify a store failure. Plumbing causes are logged here and the
  /// caller gets a generic message.
  pub fn from_store<E: Into<foyer_core::Error>>(err: E) -> Self {
    use foyer_core::Error as Core;
    match err.into() {
      Core::IdentityNotFound(id) => {
        Self::NotFound(format!("identity {id} not found"))
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

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"foyer\""),
        );
        res
      }
      Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
      Error::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, msg).into_response()
      }
      // Never expose the underlying cause to the caller.
      Error::Store(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        "operation failed, please try again",
      )
        .into_response(),
    }
  }
}
