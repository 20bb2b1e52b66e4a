//! Error types for `foyer-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::validate::{REASON_MAX, REASON_MIN};

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ────────────────────────────────────────────────────────
  #[error("email address {0:?} is not valid")]
  InvalidEmail(String),

  #[error("PIN must be exactly 4 decimal digits")]
  InvalidPin,

  #[error(
    "reason must be {min}-{max} characters after trimming, got {0}",
    min = REASON_MIN,
    max = REASON_MAX
  )]
  ReasonLength(usize),

  #[error("at least one discipline is required")]
  NoDisciplines,

  #[error("unknown discipline: {0:?}")]
  UnknownDiscipline(String),

  #[error("name must not be empty")]
  EmptyName,

  // ── Not found / conflicts ─────────────────────────────────────────────
  #[error("identity not found: {0}")]
  IdentityNotFound(Uuid),

  #[error("email {0:?} is already registered")]
  EmailTaken(String),

  #[error("identity {0} already checked in within the suppression window")]
  DuplicateVisit(Uuid),

  // ── Authentication ────────────────────────────────────────────────────
  #[error("no account registered for {0:?}")]
  EmailNotRegistered(String),

  #[error("identity {0} has no credential on record")]
  MissingCredential(Uuid),

  #[error("PIN does not match")]
  PinMismatch,

  // ── Infrastructure ────────────────────────────────────────────────────
  #[error("credential hash error: {0}")]
  CredentialHash(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A backing-store failure that is not part of the domain taxonomy.
  /// The cause is logged at the boundary and never shown to end users.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
