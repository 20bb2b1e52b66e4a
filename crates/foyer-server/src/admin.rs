//! Password-gated admin handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/admin/analytics` | Windowed counts, breakdown, recent feed |
//! | `GET` | `/admin/visitors` | `?search=&sort=&limit=&offset=` |
//! | `GET` | `/admin/visitors/{id}/visits` | Per-visitor history |
//! | `GET` | `/admin/export.csv` | `?start=&end=&discipline=&search=` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::IntoResponse,
};
use chrono::{DateTime, Local, Utc};
use foyer_core::{
  analytics::{AnalyticsSummary, WindowBounds, summarize},
  discipline::Discipline,
  export::render_csv,
  identity::{IdentityOverview, IdentityPublic},
  store::{IdentityQuery, IdentitySort, VisitFilter, VisitorStore},
  visit::Visit,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::Error};

// ─── Analytics ────────────────────────────────────────────────────────────────

/// `GET /admin/analytics`
pub async fn analytics<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<AnalyticsSummary>, Error>
where
  S: VisitorStore + 'static,
{
  let bounds = WindowBounds::at(Local::now());
  let summary = summarize(state.store.as_ref(), bounds)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(summary))
}

// ─── Visitor listing ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VisitorListParams {
  pub search: Option<String>,
  /// `recent` (default) | `name` | `visits`
  pub sort:   Option<IdentitySort>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /admin/visitors[?search=...][&sort=...][&limit=...][&offset=...]`
pub async fn list_visitors<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<VisitorListParams>,
) -> Result<Json<Vec<IdentityOverview>>, Error>
where
  S: VisitorStore + 'static,
{
  let query = IdentityQuery {
    search: params.search,
    sort:   params.sort.unwrap_or_default(),
    limit:  params.limit,
    offset: params.offset,
  };
  let listing = state
    .store
    .list_identities(&query)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(listing))
}

// ─── Visit history ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct VisitorHistory {
  pub identity: IdentityPublic,
  pub visits:   Vec<Visit>,
}

/// `GET /admin/visitors/{id}/visits`
pub async fn visitor_history<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<VisitorHistory>, Error>
where
  S: VisitorStore + 'static,
{
  let identity = state
    .store
    .get_identity(id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::NotFound(format!("identity {id} not found")))?;

  let visits = state
    .store
    .visits_for_identity(id, params.limit)
    .await
    .map_err(Error::from_store)?;

  Ok(Json(VisitorHistory {
    identity: IdentityPublic::from(identity),
    visits,
  }))
}

// ─── CSV export ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExportParams {
  pub start:      Option<DateTime<Utc>>,
  pub end:        Option<DateTime<Utc>>,
  pub discipline: Option<String>,
  pub search:     Option<String>,
}

/// `GET /admin/export.csv` — filters are conjunctive; rows come back
/// newest first.
pub async fn export_csv<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, Error>
where
  S: VisitorStore + 'static,
{
  let discipline = params
    .discipline
    .as_deref()
    .map(Discipline::parse)
    .transpose()
    .map_err(|e| Error::BadRequest(e.to_string()))?;

  let filter = VisitFilter {
    start: params.start,
    end: params.end,
    discipline,
    search: params.search,
  };

  let rows = state
    .store
    .export_visits(&filter)
    .await
    .map_err(Error::from_store)?;

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"checkins.csv\"",
      ),
    ],
    render_csv(&rows),
  ))
}
