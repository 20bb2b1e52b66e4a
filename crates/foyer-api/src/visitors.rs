//! Handlers for identity endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/register` | 400 field-tagged on validation failure |
//! | `POST` | `/login` | 401 with a distinguished reason on failure |
//! | `POST` | `/lookup` | Pre-fill lookup by email; rate limited |
//! | `POST` | `/lookup-by-pin` | Kiosk lookup; never echoes the credential |
//! | `POST` | `/profile/update` | Email is immutable |

use axum::{Json, extract::State};
use foyer_core::{
  Error as CoreError,
  credential::PinCredential,
  discipline::Discipline,
  identity::{IdentityPublic, NewIdentity, ProfileChanges},
  store::VisitorStore,
  validate,
  visit::Visit,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiContext, error::ApiError};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:          String,
  pub name:           String,
  #[serde(default)]
  pub preferred_name: Option<String>,
  #[serde(default)]
  pub workplace:      Option<String>,
  pub pin:            String,
  pub disciplines:    Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub identity_id: Uuid,
}

/// `POST /register`
pub async fn register<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<Json<RegisterResponse>, ApiError>
where
  S: VisitorStore,
{
  let email = validate::normalize_email(&body.email);
  validate::check_email(&email).map_err(|e| ApiError::validation("email", e))?;
  validate::check_pin(&body.pin).map_err(|e| ApiError::validation("pin", e))?;
  let disciplines = Discipline::parse_set(&body.disciplines)
    .map_err(|e| ApiError::validation("disciplines", e))?;
  let name = validate::clean_name(&body.name)
    .map_err(|e| ApiError::validation("name", e))?;
  let preferred_name = validate::clean_optional(body.preferred_name.as_deref());
  let workplace = validate::clean_optional(body.workplace.as_deref());

  let credential =
    PinCredential::hash_pin(&body.pin).map_err(ApiError::from_core)?;

  let identity = ctx
    .store
    .register(NewIdentity {
      email,
      name,
      preferred_name,
      workplace,
      disciplines,
      credential,
    })
    .await
    .map_err(ApiError::from_core)?;

  Ok(Json(RegisterResponse {
    identity_id: identity.identity_id,
  }))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email: String,
  pub pin:   String,
}

/// `POST /login`
///
/// The three failure cases answer 401 with distinct messages: unknown
/// email, account without a credential, wrong PIN.
pub async fn login<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<IdentityPublic>, ApiError>
where
  S: VisitorStore,
{
  let email = validate::normalize_email(&body.email);
  validate::check_email(&email).map_err(|e| ApiError::validation("email", e))?;
  validate::check_pin(&body.pin).map_err(|e| ApiError::validation("pin", e))?;

  if !ctx.limiter.allow(&email) {
    return Err(ApiError::RateLimited);
  }

  let identity = ctx
    .store
    .find_by_email(&email)
    .await
    .map_err(ApiError::from_core)?
    .ok_or_else(|| {
      ApiError::from_core(CoreError::EmailNotRegistered(email.clone()))
    })?;

  let Some(credential) = &identity.credential else {
    return Err(ApiError::from_core(CoreError::MissingCredential(
      identity.identity_id,
    )));
  };

  if !credential.verify(&body.pin) {
    return Err(ApiError::from_core(CoreError::PinMismatch));
  }

  Ok(Json(IdentityPublic::from(identity)))
}

// ─── Lookup by email ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupBody {
  pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
  pub exists:       bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub identity:     Option<IdentityPublic>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub latest_visit: Option<Visit>,
}

/// `POST /lookup` — pre-fill convenience; absence of a prior visit is not
/// an error.
pub async fn lookup<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<LookupBody>,
) -> Result<Json<LookupResponse>, ApiError>
where
  S: VisitorStore,
{
  let email = validate::normalize_email(&body.email);

  if !ctx.limiter.allow(&email) {
    return Err(ApiError::RateLimited);
  }

  let Some(identity) = ctx
    .store
    .find_by_email(&email)
    .await
    .map_err(ApiError::from_core)?
  else {
    return Ok(Json(LookupResponse {
      exists:       false,
      identity:     None,
      latest_visit: None,
    }));
  };

  let latest_visit = ctx
    .store
    .latest_visit(identity.identity_id)
    .await
    .map_err(ApiError::from_core)?;

  Ok(Json(LookupResponse {
    exists:       true,
    identity:     Some(IdentityPublic::from(identity)),
    latest_visit,
  }))
}

// ─── Lookup by PIN ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupByPinBody {
  pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct LookupByPinResponse {
  pub exists:   bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub identity: Option<IdentityPublic>,
}

/// `POST /lookup-by-pin` — the response never carries the credential.
pub async fn lookup_by_pin<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<LookupByPinBody>,
) -> Result<Json<LookupByPinResponse>, ApiError>
where
  S: VisitorStore,
{
  validate::check_pin(&body.pin).map_err(|e| ApiError::validation("pin", e))?;

  // Separate keyspace from the email-keyed endpoints.
  if !ctx.limiter.allow(&format!("pin:{}", body.pin)) {
    return Err(ApiError::RateLimited);
  }

  let identity = ctx
    .store
    .find_by_pin(&body.pin)
    .await
    .map_err(ApiError::from_core)?;

  Ok(Json(LookupByPinResponse {
    exists:   identity.is_some(),
    identity: identity.map(IdentityPublic::from),
  }))
}

// ─── Profile update ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
  pub identity_id:    Uuid,
  pub name:           String,
  #[serde(default)]
  pub preferred_name: Option<String>,
  #[serde(default)]
  pub workplace:      Option<String>,
  pub disciplines:    Vec<String>,
  /// A new PIN re-hashes with a fresh salt; omitted keeps the current one.
  #[serde(default)]
  pub pin:            Option<String>,
}

/// `POST /profile/update`
pub async fn update_profile<S>(
  State(ctx): State<ApiContext<S>>,
  Json(body): Json<UpdateProfileBody>,
) -> Result<Json<IdentityPublic>, ApiError>
where
  S: VisitorStore,
{
  let disciplines = Discipline::parse_set(&body.disciplines)
    .map_err(|e| ApiError::validation("disciplines", e))?;
  let name = validate::clean_name(&body.name)
    .map_err(|e| ApiError::validation("name", e))?;
  let preferred_name = validate::clean_optional(body.preferred_name.as_deref());
  let workplace = validate::clean_optional(body.workplace.as_deref());

  let credential = match &body.pin {
    Some(pin) => {
      validate::check_pin(pin).map_err(|e| ApiError::validation("pin", e))?;
      Some(PinCredential::hash_pin(pin).map_err(ApiError::from_core)?)
    }
    None => None,
  };

  let updated = ctx
    .store
    .update_profile(body.identity_id, ProfileChanges {
      name,
      preferred_name,
      workplace,
      disciplines,
      credential,
    })
    .await
    .map_err(ApiError::from_core)?;

  Ok(Json(IdentityPublic::from(updated)))
}
