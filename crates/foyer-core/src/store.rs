//! The `VisitorStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `foyer-store-sqlite`). Higher layers (`foyer-api`, `foyer-server`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  analytics::DisciplineCount,
  discipline::Discipline,
  identity::{Identity, IdentityOverview, NewIdentity, ProfileChanges},
  visit::{Visit, VisitWithIdentity},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Conjunctive filters for [`VisitorStore::export_visits`].
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
  /// Keep visits recorded at or after this instant.
  pub start:      Option<DateTime<Utc>>,
  /// Keep visits recorded at or before this instant.
  pub end:        Option<DateTime<Utc>>,
  /// Keep visits whose discipline snapshot contains this member.
  pub discipline: Option<Discipline>,
  /// Case-insensitive substring match on the joined identity's name or
  /// email.
  pub search:     Option<String>,
}

/// Sort order for the admin visitor listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySort {
  /// Most recent visit first; identities without visits last.
  #[default]
  Recent,
  /// Case-insensitive by name.
  Name,
  /// Highest visit count first.
  Visits,
}

/// Parameters for [`VisitorStore::list_identities`].
#[derive(Debug, Clone, Default)]
pub struct IdentityQuery {
  /// Case-insensitive substring match on name or email.
  pub search: Option<String>,
  pub sort:   IdentitySort,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Foyer storage backend.
///
/// Visits are append-only; identities are created on registration and
/// mutated only through [`VisitorStore::update_profile`] and the
/// `updated_at` refresh performed by [`VisitorStore::record_visit`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Backend errors
/// must convert into the [`crate::Error`] taxonomy so callers can
/// distinguish conflicts and not-found outcomes from plumbing failures.
pub trait VisitorStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Persist a new identity. Fails with an email-taken error if the
  /// normalized email already exists.
  fn register(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Retrieve an identity by id. Returns `None` if not found.
  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Retrieve an identity by its normalized email.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// PIN-first lookup for the kiosk flow. Because credentials are stored
  /// only as salted hashes there is no index to probe; the store verifies
  /// the candidate PIN against each identity's hash and returns the first
  /// match.
  fn find_by_pin<'a>(
    &'a self,
    pin: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Apply profile changes. Email is immutable; a `Some` credential
  /// replaces the stored hash; `updated_at` is refreshed.
  fn update_profile(
    &self,
    id: Uuid,
    changes: ProfileChanges,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Admin listing: identities joined with visit counts and last-visit
  /// timestamps, filtered, sorted, and paginated per `query`.
  fn list_identities<'a>(
    &'a self,
    query: &'a IdentityQuery,
  ) -> impl Future<Output = Result<Vec<IdentityOverview>, Self::Error>> + Send + 'a;

  // ── Visits ────────────────────────────────────────────────────────────

  /// The check-in write. Verifies the identity exists, rejects a second
  /// visit within [`crate::visit::DUPLICATE_WINDOW_SECS`] of the previous
  /// one, snapshots the identity's current disciplines, appends the visit,
  /// and refreshes the identity's `updated_at`. The `reason` must already
  /// be sanitized and bounds-checked.
  fn record_visit(
    &self,
    identity_id: Uuid,
    reason: String,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  /// The identity's most recent visit, if any. Used to pre-fill the
  /// check-in form after an email lookup.
  fn latest_visit(
    &self,
    identity_id: Uuid,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + '_;

  /// Per-identity history, newest first.
  fn visits_for_identity(
    &self,
    identity_id: Uuid,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + '_;

  // ── Aggregation ───────────────────────────────────────────────────────

  /// Number of visits recorded at or after `since`.
  fn count_visits_since(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// For every member of the discipline enumeration, the number of visits
  /// whose snapshot contains it. A multi-discipline visit increments
  /// several counters, so the sum may exceed the total visit count.
  fn discipline_breakdown(
    &self,
  ) -> impl Future<Output = Result<Vec<DisciplineCount>, Self::Error>> + Send + '_;

  /// The most recent visits joined with their identities' current name and
  /// email, newest first.
  fn recent_activity(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<VisitWithIdentity>, Self::Error>> + Send + '_;

  /// Filtered, joined export view, newest first.
  fn export_visits<'a>(
    &'a self,
    filter: &'a VisitFilter,
  ) -> impl Future<Output = Result<Vec<VisitWithIdentity>, Self::Error>> + Send + 'a;
}
