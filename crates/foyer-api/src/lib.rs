//! Visitor-facing JSON API for Foyer.
//!
//! Exposes an axum [`Router`] backed by any
//! [`foyer_core::store::VisitorStore`]. Admin auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", foyer_api::api_router(ApiContext::new(store.clone())))
//! ```

pub mod checkin;
pub mod error;
pub mod rate;
pub mod visitors;

use std::sync::Arc;

use axum::{Router, routing::post};
use foyer_core::store::VisitorStore;

pub use error::ApiError;
use rate::RateLimiter;

/// Shared state threaded through all API handlers.
pub struct ApiContext<S> {
  pub store:   Arc<S>,
  /// Guards the lookup and login endpoints: 10 requests per rolling
  /// minute per client identity.
  pub limiter: Arc<RateLimiter>,
}

// Manual impl: cloning the context never requires cloning the store itself.
impl<S> Clone for ApiContext<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      limiter: Arc::clone(&self.limiter),
    }
  }
}

impl<S> ApiContext<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      limiter: Arc::new(RateLimiter::default()),
    }
  }
}

/// Build a fully-materialised API router for `context`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(context: ApiContext<S>) -> Router<()>
where
  S: VisitorStore + 'static,
{
  Router::new()
    // Identity
    .route("/register", post(visitors::register::<S>))
    .route("/login", post(visitors::login::<S>))
    .route("/lookup", post(visitors::lookup::<S>))
    .route("/lookup-by-pin", post(visitors::lookup_by_pin::<S>))
    .route("/profile/update", post(visitors::update_profile::<S>))
    // Check-in
    .route("/checkin", post(checkin::check_in::<S>))
    .route("/kiosk/checkin", post(checkin::kiosk_check_in::<S>))
    .with_state(context)
}
