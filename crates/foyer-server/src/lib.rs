//! HTTP server layer for Foyer.
//!
//! Mounts the visitor API under `/api` and the password-gated admin surface
//! under `/admin`, over any [`VisitorStore`]. The state is built once in
//! `main` and injected here; nothing is created lazily or globally.

pub mod admin;
pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use foyer_api::ApiContext;
use foyer_core::store::VisitorStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AdminAuth;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` merged
/// with `FOYER_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  pub admin_password_hash: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all admin handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AdminAuth>,
}

// Manual impl: cloning the state never requires cloning the store itself.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
      auth:   Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: visitor API, admin surface, health
/// probe, and request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: VisitorStore + 'static,
{
  let api = foyer_api::api_router(ApiContext::new(Arc::clone(&state.store)));

  Router::new()
    .route("/healthz", get(healthz))
    .route("/admin/analytics", get(admin::analytics::<S>))
    .route("/admin/visitors", get(admin::list_visitors::<S>))
    .route("/admin/visitors/{id}/visits", get(admin::visitor_history::<S>))
    .route("/admin/export.csv", get(admin::export_csv::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

/// Unauthenticated liveness probe.
async fn healthz() -> &'static str {
  "ok"
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use foyer_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const REASON: &str = "Working on firmware bring-up";

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();

    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:                "127.0.0.1".to_string(),
        port:                8080,
        store_path:          PathBuf::from(":memory:"),
        admin_username:      "admin".to_string(),
        admin_password_hash: hash.clone(),
      }),
      auth:   Arc::new(AdminAuth {
        username:      "admin".to_string(),
        password_hash: hash,
      }),
    }
  }

  fn admin_basic() -> String {
    format!("Basic {}", B64.encode("admin:secret"))
  }

  async fn post_json(
    state: &AppState<SqliteStore>,
    uri: &str,
    body: Value,
  ) -> axum::response::Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn get_admin(
    state: &AppState<SqliteStore>,
    uri: &str,
    authorization: Option<&str>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    let req = builder.body(Body::empty()).unwrap();
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn body_text(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  fn register_body(email: &str, name: &str, pin: &str) -> Value {
    json!({
      "email": email,
      "name": name,
      "pin": pin,
      "disciplines": ["Software"],
    })
  }

  async fn register_alice(state: &AppState<SqliteStore>) -> Uuid {
    let resp = post_json(
      state,
      "/api/register",
      register_body("alice@example.org", "Alice", "1234"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["identity_id"].as_str().unwrap().parse().unwrap()
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn healthz_needs_no_auth() {
    let state = make_state().await;
    let resp = get_admin(&state, "/healthz", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Registration ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_returns_identity_id() {
    let state = make_state().await;
    register_alice(&state).await;
  }

  #[tokio::test]
  async fn register_normalizes_email_and_rejects_duplicates() {
    let state = make_state().await;
    register_alice(&state).await;

    // Same address with different case: still a duplicate.
    let resp = post_json(
      &state,
      "/api/register",
      register_body("  ALICE@Example.org ", "Imposter", "5678"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["kind"], "conflict");
  }

  #[tokio::test]
  async fn register_rejects_bad_pin_with_field_tag() {
    let state = make_state().await;
    let resp = post_json(
      &state,
      "/api/register",
      register_body("alice@example.org", "Alice", "12ab"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["field"], "pin");
  }

  #[tokio::test]
  async fn register_rejects_unknown_discipline() {
    let state = make_state().await;
    let resp = post_json(
      &state,
      "/api/register",
      json!({
        "email": "alice@example.org",
        "name": "Alice",
        "pin": "1234",
        "disciplines": ["Creative"],
      }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["field"], "disciplines");
  }

  #[tokio::test]
  async fn register_rejects_empty_disciplines() {
    let state = make_state().await;
    let resp = post_json(
      &state,
      "/api/register",
      json!({
        "email": "alice@example.org",
        "name": "Alice",
        "pin": "1234",
        "disciplines": [],
      }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Login ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_round_trip_returns_public_fields_only() {
    let state = make_state().await;
    register_alice(&state).await;

    let resp = post_json(
      &state,
      "/api/login",
      json!({ "email": "Alice@Example.org", "pin": "1234" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["email"], "alice@example.org");
    assert_eq!(body["name"], "Alice");
    assert!(body.get("credential").is_none(), "credential leaked: {body}");
  }

  #[tokio::test]
  async fn login_wrong_pin_is_distinguished() {
    let state = make_state().await;
    register_alice(&state).await;

    let resp = post_json(
      &state,
      "/api/login",
      json!({ "email": "alice@example.org", "pin": "9999" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "incorrect PIN");
  }

  #[tokio::test]
  async fn login_unknown_email_prompts_registration() {
    let state = make_state().await;
    let resp = post_json(
      &state,
      "/api/login",
      json!({ "email": "nobody@example.org", "pin": "1234" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert!(
      body["error"].as_str().unwrap().contains("register"),
      "unexpected message: {body}"
    );
  }

  // ── Check-in ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn checkin_then_immediate_repeat_is_suppressed() {
    let state = make_state().await;
    let id = register_alice(&state).await;

    let resp = post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["reason"], REASON);
    assert_eq!(body["disciplines"], json!(["Software"]));

    let resp = post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": "Testing again today" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["kind"], "conflict");
  }

  #[tokio::test]
  async fn checkin_rejects_out_of_range_reason() {
    let state = make_state().await;
    let id = register_alice(&state).await;

    let resp = post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": "too short" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["field"], "reason");

    let resp = post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": "x".repeat(501) }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn checkin_unknown_identity_is_404() {
    let state = make_state().await;
    let resp = post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": Uuid::new_v4(), "reason": REASON }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Kiosk flow ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn kiosk_checkin_registers_unknown_pin_then_suppresses_repeat() {
    let state = make_state().await;

    let body = json!({
      "pin": "7777",
      "email": "carol@example.org",
      "name": "Carol",
      "disciplines": ["Art", "Design"],
      "reason": REASON,
    });

    let resp = post_json(&state, "/api/kiosk/checkin", body.clone()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let payload = body_json(resp).await;
    assert_eq!(payload["registered"], true);
    assert_eq!(payload["identity"]["email"], "carol@example.org");
    assert_eq!(payload["visit"]["disciplines"], json!(["Art", "Design"]));

    // Same PIN straight away: the identity resolves but the window rejects.
    let resp = post_json(&state, "/api/kiosk/checkin", body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let payload = body_json(resp).await;
    assert_eq!(payload["kind"], "conflict");
  }

  // ── Lookup ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn lookup_reports_existence_and_latest_visit() {
    let state = make_state().await;
    let id = register_alice(&state).await;

    let resp = post_json(
      &state,
      "/api/lookup",
      json!({ "email": "alice@example.org" }),
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["exists"], true);
    assert!(body.get("latest_visit").is_none());

    post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;

    let resp = post_json(
      &state,
      "/api/lookup",
      json!({ "email": "alice@example.org" }),
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["latest_visit"]["reason"], REASON);

    let resp = post_json(
      &state,
      "/api/lookup",
      json!({ "email": "nobody@example.org" }),
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["exists"], false);
  }

  #[tokio::test]
  async fn lookup_by_pin_never_echoes_credential() {
    let state = make_state().await;
    register_alice(&state).await;

    let resp =
      post_json(&state, "/api/lookup-by-pin", json!({ "pin": "1234" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["exists"], true);
    assert_eq!(body["identity"]["email"], "alice@example.org");
    assert!(body["identity"].get("credential").is_none());

    let resp =
      post_json(&state, "/api/lookup-by-pin", json!({ "pin": "0000" })).await;
    let body = body_json(resp).await;
    assert_eq!(body["exists"], false);
  }

  #[tokio::test]
  async fn lookup_rate_limit_answers_429() {
    let state = make_state().await;
    // One router instance so the limiter's window accumulates.
    let app = router(state);

    for _ in 0..10 {
      let req = Request::builder()
        .method("POST")
        .uri("/api/lookup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
          json!({ "email": "alice@example.org" }).to_string(),
        ))
        .unwrap();
      let resp = app.clone().oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = Request::builder()
      .method("POST")
      .uri("/api/lookup")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(
        json!({ "email": "alice@example.org" }).to_string(),
      ))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
  }

  // ── Profile update ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_update_changes_disciplines_and_pin() {
    let state = make_state().await;
    let id = register_alice(&state).await;

    let resp = post_json(
      &state,
      "/api/profile/update",
      json!({
        "identity_id": id,
        "name": "Alice Liddell",
        "workplace": "Loft 4B",
        "disciplines": ["Hardware"],
        "pin": "4321",
      }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["name"], "Alice Liddell");
    // Email is immutable and unchanged.
    assert_eq!(body["email"], "alice@example.org");

    // Old PIN no longer authenticates; the new one does.
    let resp = post_json(
      &state,
      "/api/login",
      json!({ "email": "alice@example.org", "pin": "1234" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = post_json(
      &state,
      "/api/login",
      json!({ "email": "alice@example.org", "pin": "4321" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Admin auth ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_endpoints_reject_missing_or_wrong_credentials() {
    let state = make_state().await;

    let resp = get_admin(&state, "/admin/analytics", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let wrong = format!("Basic {}", B64.encode("admin:wrong"));
    let resp = get_admin(&state, "/admin/analytics", Some(&wrong)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Admin analytics ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_analytics_counts_todays_checkin() {
    let state = make_state().await;
    let id = register_alice(&state).await;
    post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;

    let auth = admin_basic();
    let resp = get_admin(&state, "/admin/analytics", Some(&auth)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    assert_eq!(body["today_count"], 1);
    assert_eq!(body["week_count"], 1);
    assert_eq!(body["month_count"], 1);
    assert_eq!(body["discipline_breakdown"].as_array().unwrap().len(), 8);
    assert_eq!(body["recent_activity"][0]["name"], "Alice");
    assert_eq!(body["recent_activity"][0]["email"], "alice@example.org");
  }

  // ── Admin listing and history ───────────────────────────────────────────────

  #[tokio::test]
  async fn admin_visitors_listing_carries_visit_counts() {
    let state = make_state().await;
    let id = register_alice(&state).await;
    post_json(
      &state,
      "/api/register",
      register_body("bob@example.org", "Bob", "5678"),
    )
    .await;
    post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;

    let auth = admin_basic();
    let resp =
      get_admin(&state, "/admin/visitors?sort=visits", Some(&auth)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let listing = body.as_array().unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0]["identity"]["email"], "alice@example.org");
    assert_eq!(listing[0]["visit_count"], 1);
    assert_eq!(listing[1]["visit_count"], 0);
  }

  #[tokio::test]
  async fn admin_visitor_history_and_unknown_id() {
    let state = make_state().await;
    let id = register_alice(&state).await;
    post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;

    let auth = admin_basic();
    let resp = get_admin(
      &state,
      &format!("/admin/visitors/{id}/visits"),
      Some(&auth),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["identity"]["email"], "alice@example.org");
    assert_eq!(body["visits"].as_array().unwrap().len(), 1);

    let resp = get_admin(
      &state,
      &format!("/admin/visitors/{}/visits", Uuid::new_v4()),
      Some(&auth),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Admin export ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_export_returns_quoted_csv() {
    let state = make_state().await;
    let id = register_alice(&state).await;
    post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;

    let auth = admin_basic();
    let resp = get_admin(&state, "/admin/export.csv", Some(&auth)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap()
      .to_string();
    assert!(content_type.starts_with("text/csv"), "got {content_type}");

    let text = body_text(resp).await;
    assert!(text.starts_with("Timestamp,Name,Email,Disciplines,Reason\r\n"));
    assert!(text.contains("\"Alice\""));
    assert!(text.contains(&format!("\"{REASON}\"")));
  }

  #[tokio::test]
  async fn admin_export_filters_by_search_and_rejects_bad_discipline() {
    let state = make_state().await;
    let id = register_alice(&state).await;
    post_json(
      &state,
      "/api/checkin",
      json!({ "identity_id": id, "reason": REASON }),
    )
    .await;

    let auth = admin_basic();
    let resp =
      get_admin(&state, "/admin/export.csv?search=nobody", Some(&auth)).await;
    let text = body_text(resp).await;
    // Header only: the search matched nothing.
    assert_eq!(text, "Timestamp,Name,Email,Disciplines,Reason\r\n");

    let resp = get_admin(
      &state,
      "/admin/export.csv?discipline=Pottery",
      Some(&auth),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
