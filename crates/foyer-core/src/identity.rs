//! Identity — one record per unique visitor email.
//!
//! The credential never leaves the store layer: API responses use
//! [`IdentityPublic`], which carries everything except the hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{credential::PinCredential, discipline::Discipline};

/// A registered visitor. `email` is unique (case-normalized) and immutable
/// after registration; everything else may change on profile update.
#[derive(Debug, Clone)]
pub struct Identity {
  pub identity_id:    Uuid,
  pub email:          String,
  pub name:           String,
  pub preferred_name: Option<String>,
  pub workplace:      Option<String>,
  /// Never empty.
  pub disciplines:    Vec<Discipline>,
  /// `None` only for rows imported from a source without credentials;
  /// registration always sets one.
  pub credential:     Option<PinCredential>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// The identity fields safe to put on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityPublic {
  pub identity_id:    Uuid,
  pub email:          String,
  pub name:           String,
  pub preferred_name: Option<String>,
  pub workplace:      Option<String>,
  pub disciplines:    Vec<Discipline>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl From<&Identity> for IdentityPublic {
  fn from(identity: &Identity) -> Self {
    Self {
      identity_id:    identity.identity_id,
      email:          identity.email.clone(),
      name:           identity.name.clone(),
      preferred_name: identity.preferred_name.clone(),
      workplace:      identity.workplace.clone(),
      disciplines:    identity.disciplines.clone(),
      created_at:     identity.created_at,
      updated_at:     identity.updated_at,
    }
  }
}

impl From<Identity> for IdentityPublic {
  fn from(identity: Identity) -> Self {
    Self::from(&identity)
  }
}

/// Input to [`crate::store::VisitorStore::register`]. All free text is
/// already sanitized, the email normalized, and the PIN hashed by the
/// caller; timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub email:          String,
  pub name:           String,
  pub preferred_name: Option<String>,
  pub workplace:      Option<String>,
  pub disciplines:    Vec<Discipline>,
  pub credential:     PinCredential,
}

/// Input to [`crate::store::VisitorStore::update_profile`]. Email is
/// immutable and therefore absent. A `Some` credential replaces the stored
/// one (already re-hashed with a fresh salt); `None` retains it.
#[derive(Debug, Clone)]
pub struct ProfileChanges {
  pub name:           String,
  pub preferred_name: Option<String>,
  pub workplace:      Option<String>,
  pub disciplines:    Vec<Discipline>,
  pub credential:     Option<PinCredential>,
}

/// One row of the admin visitor listing: the public identity joined with
/// its visit statistics.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityOverview {
  pub identity:    IdentityPublic,
  pub visit_count: u64,
  pub last_visit:  Option<DateTime<Utc>>,
}
