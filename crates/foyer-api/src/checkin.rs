//! Handlers for the check-in endpoints.
//!
//! Both flows converge on the store's duplicate-suppressed visit write: the
//! reason is sanitized and bounds-checked first, so nothing is persisted for
//! an invalid request, and a repeat check-in inside the window answers 400
//! with a conflict-tagged body.

use axum::{Json, extract::State};
use foyer_core::{
  credential::PinCredential,
  discipline::Discipline,
  identity::{IdentityPublic, NewIdentity},
  store::VisitorStore,
  validate,
  visit::Visit,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiContext, error::ApiError};

// ─── Standard flow ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckinBody {
  pub identity_id: Uuid,
  pub reason:      String,
}

/// `POST /checkin` — body: `{"identity_id": "...", "reason": "..."}`
pub async fn check_in<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<CheckinBody>,
) -> Result<Json<Visit>, ApiError>
where
  S: VisitorStore,
{
  let reason = validate::clean_reason(&body.reason)
    .map_err(|e| ApiError::validation("reason", e))?;

  let visit = ctx
    .store
    .record_visit(body.identity_id, reason)
    .await
    .map_err(ApiError::from_core)?;

  Ok(Json(visit))
}

// ─── Kiosk flow ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct KioskCheckinBody {
  pub pin:         String,
  pub email:       String,
  pub name:        String,
  #[serde(default)]
  pub workplace:   Option<String>,
  pub disciplines: Vec<String>,
  pub reason:      String,
}

#[derive(Debug, Serialize)]
pub struct KioskCheckinResponse {
  pub identity:   IdentityPublic,
  pub visit:      Visit,
  /// True when this request created the identity.
  pub registered: bool,
}

/// `POST /kiosk/checkin` — the PIN-first alternate flow: look up by PIN,
/// register when unknown, then the same validated, duplicate-suppressed
/// check-in write.
pub async fn kiosk_check_in<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<KioskCheckinBody>,
) -> Result<Json<KioskCheckinResponse>, ApiError>
where
  S: VisitorStore,
{
  validate::check_pin(&body.pin).map_err(|e| ApiError::validation("pin", e))?;
  // Validate the reason up front so a bad request writes nothing, even on
  // the register path.
  let reason = validate::clean_reason(&body.reason)
    .map_err(|e| ApiError::validation("reason", e))?;

  let known = ctx
    .store
    .find_by_pin(&body.pin)
    .await
    .map_err(ApiError::from_core)?;

  let (identity, registered) = match known {
    Some(identity) => (identity, false),
    None => {
      let email = validate::normalize_email(&body.email);
      validate::check_email(&email)
        .map_err(|e| ApiError::validation("email", e))?;
      let disciplines = Discipline::parse_set(&body.disciplines)
        .map_err(|e| ApiError::validation("disciplines", e))?;
      let name = validate::clean_name(&body.name)
        .map_err(|e| ApiError::validation("name", e))?;
      let workplace = validate::clean_optional(body.workplace.as_deref());
      let credential =
        PinCredential::hash_pin(&body.pin).map_err(ApiError::from_core)?;

      let created = ctx
        .store
        .register(NewIdentity {
          email,
          name,
          preferred_name: None,
          workplace,
          disciplines,
          credential,
        })
        .await
        .map_err(ApiError::from_core)?;
      (created, true)
    }
  };

  let visit = ctx
    .store
    .record_visit(identity.identity_id, reason)
    .await
    .map_err(ApiError::from_core)?;

  Ok(Json(KioskCheckinResponse {
    identity: IdentityPublic::from(identity),
    visit,
    registered,
  }))
}
