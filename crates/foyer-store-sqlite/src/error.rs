//! Error type for `foyer-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] foyer_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to check in or update an identity that was not found.
  #[error("identity not found: {0}")]
  IdentityNotFound(Uuid),

  #[error("email {0:?} is already registered")]
  EmailTaken(String),

  /// A second check-in landed inside the suppression window.
  #[error("identity {0} already checked in within the suppression window")]
  DuplicateVisit(Uuid),
}

/// Collapse into the core taxonomy so generic callers can classify the
/// failure without knowing this backend.
impl From<Error> for foyer_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      Error::IdentityNotFound(id) => Self::IdentityNotFound(id),
      Error::EmailTaken(email) => Self::EmailTaken(email),
      Error::DuplicateVisit(id) => Self::DuplicateVisit(id),
      other => Self::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
