//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Discipline lists are
//! stored as compact JSON arrays of their wire labels. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use foyer_core::{
  credential::PinCredential,
  discipline::Discipline,
  identity::{Identity, IdentityOverview, IdentityPublic},
  visit::{Visit, VisitWithIdentity},
};
use uuid::Uuid;

use crate::Result;

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| crate::Error::DateParse(e.to_string()))
}

// ─── Disciplines ─────────────────────────────────────────────────────────────

pub fn encode_disciplines(set: &[Discipline]) -> Result<String> {
  Ok(serde_json::to_string(set)?)
}

pub fn decode_disciplines(s: &str) -> Result<Vec<Discipline>> {
  Ok(serde_json::from_str(s)?)
}

/// The LIKE pattern that matches a JSON-encoded snapshot containing
/// `discipline` — the quoted label is unambiguous within the array text.
pub fn discipline_like_pattern(discipline: Discipline) -> String {
  format!("%\"{}\"%", discipline.label())
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:    String,
  pub email:          String,
  pub name:           String,
  pub preferred_name: Option<String>,
  pub workplace:      Option<String>,
  pub disciplines:    String,
  pub credential:     Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawIdentity {
  pub const COLUMNS: &'static str =
    "identity_id, email, name, preferred_name, workplace, disciplines, \
     credential, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:    row.get(0)?,
      email:          row.get(1)?,
      name:           row.get(2)?,
      preferred_name: row.get(3)?,
      workplace:      row.get(4)?,
      disciplines:    row.get(5)?,
      credential:     row.get(6)?,
      created_at:     row.get(7)?,
      updated_at:     row.get(8)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:    decode_uuid(&self.identity_id)?,
      email:          self.email,
      name:           self.name,
      preferred_name: self.preferred_name,
      workplace:      self.workplace,
      disciplines:    decode_disciplines(&self.disciplines)?,
      credential:     self.credential.map(PinCredential::from_phc),
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `visits` row.
pub struct RawVisit {
  pub visit_id:    String,
  pub identity_id: String,
  pub recorded_at: String,
  pub reason:      String,
  pub disciplines: String,
}

impl RawVisit {
  pub const COLUMNS: &'static str =
    "visit_id, identity_id, recorded_at, reason, disciplines";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visit_id:    row.get(0)?,
      identity_id: row.get(1)?,
      recorded_at: row.get(2)?,
      reason:      row.get(3)?,
      disciplines: row.get(4)?,
    })
  }

  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      visit_id:    decode_uuid(&self.visit_id)?,
      identity_id: decode_uuid(&self.identity_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
      reason:      self.reason,
      disciplines: decode_disciplines(&self.disciplines)?,
    })
  }
}

/// A `visits` row joined with the owning identity's current name and email.
pub struct RawJoinedVisit {
  pub visit: RawVisit,
  pub name:  String,
  pub email: String,
}

impl RawJoinedVisit {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visit: RawVisit::from_row(row)?,
      name:  row.get(5)?,
      email: row.get(6)?,
    })
  }

  pub fn into_joined(self) -> Result<VisitWithIdentity> {
    Ok(VisitWithIdentity {
      visit: self.visit.into_visit()?,
      name:  self.name,
      email: self.email,
    })
  }
}

/// An `identities` row joined with its visit statistics.
pub struct RawOverview {
  pub identity:    RawIdentity,
  pub visit_count: i64,
  pub last_visit:  Option<String>,
}

impl RawOverview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity:    RawIdentity::from_row(row)?,
      visit_count: row.get(9)?,
      last_visit:  row.get(10)?,
    })
  }

  pub fn into_overview(self) -> Result<IdentityOverview> {
    let identity = self.identity.into_identity()?;
    Ok(IdentityOverview {
      identity:    IdentityPublic::from(identity),
      visit_count: self.visit_count.max(0) as u64,
      last_visit:  self.last_visit.as_deref().map(decode_dt).transpose()?,
    })
  }
}
