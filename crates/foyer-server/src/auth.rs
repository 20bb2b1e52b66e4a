//! HTTP Basic-auth extractor for the admin surface.
//!
//! Credentials come from `config.toml`: a username and an argon2 PHC hash
//! of the dashboard password (generate one with `--hash-password`).

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use foyer_core::store::VisitorStore;

use crate::{AppState, error::Error};

/// The single admin credential accepted by this server instance.
#[derive(Clone)]
pub struct AdminAuth {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Zero-size marker: present in the handler means the request was
/// authenticated.
pub struct Authenticated;

/// Pull `(username, password)` out of a Basic Authorization header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers
    .get(axum::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?;
  let encoded = value.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let text = String::from_utf8(decoded).ok()?;
  let (user, pass) = text.split_once(':')?;
  Some((user.to_string(), pass.to_string()))
}

/// Verify credentials directly from headers.
pub fn verify_admin(headers: &HeaderMap, auth: &AdminAuth) -> Result<(), Error> {
  let (username, password) =
    basic_credentials(headers).ok_or(Error::Unauthorized)?;

  if username != auth.username {
    return Err(Error::Unauthorized);
  }

  let parsed = PasswordHash::new(&auth.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: VisitorStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_admin(&parts.headers, &state.auth)?;
    Ok(Authenticated)
  }
}
