//! Visit — one immutable check-in event.
//!
//! A visit snapshots the identity's disciplines at creation time; the
//! snapshot does not change when the identity is edited later. Visits are
//! never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discipline::Discipline;

/// Seconds after a visit during which the same identity may not create
/// another one.
pub const DUPLICATE_WINDOW_SECS: i64 = 60;

/// An append-only check-in record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
  pub visit_id:    Uuid,
  pub identity_id: Uuid,
  /// Server-assigned; never changes after creation.
  pub recorded_at: DateTime<Utc>,
  /// Sanitized and trimmed, 10-500 characters.
  pub reason:      String,
  /// The identity's disciplines at the time of the visit. Never empty.
  pub disciplines: Vec<Discipline>,
}

/// A visit joined with its owning identity's *current* name and email, as
/// used by the recent-activity feed, per-visitor history, and CSV export.
#[derive(Debug, Clone, Serialize)]
pub struct VisitWithIdentity {
  #[serde(flatten)]
  pub visit: Visit,
  pub name:  String,
  pub email: String,
}
