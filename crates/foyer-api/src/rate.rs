//! Fixed-window request limiter keyed by client identity.
//!
//! Re-expresses the source system's client-side lookup throttle as a
//! server-side guard: each key (normalized email or candidate PIN) gets a
//! fixed window of requests; the window resets when it ages out. This is a
//! load guard, not a correctness mechanism.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

/// Requests allowed per key per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;
/// Window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Number of tracked keys above which stale windows are swept out.
const SWEEP_THRESHOLD: usize = 4096;

struct Slot {
  started: Instant,
  count:   u32,
}

/// A fixed-window counter over an in-memory key map.
pub struct RateLimiter {
  max:    u32,
  window: Duration,
  slots:  Mutex<HashMap<String, Slot>>,
}

impl Default for RateLimiter {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
  }
}

impl RateLimiter {
  pub fn new(max: u32, window: Duration) -> Self {
    Self {
      max,
      window,
      slots: Mutex::new(HashMap::new()),
    }
  }

  /// Record one request for `key`; `false` means the window is exhausted.
  pub fn allow(&self, key: &str) -> bool {
    let now = Instant::now();
    let mut slots = self
      .slots
      .lock()
      .unwrap_or_else(PoisonError::into_inner);

    if slots.len() > SWEEP_THRESHOLD {
      let window = self.window;
      slots.retain(|_, slot| now.duration_since(slot.started) < window);
    }

    match slots.get_mut(key) {
      Some(slot) if now.duration_since(slot.started) < self.window => {
        if slot.count >= self.max {
          false
        } else {
          slot.count += 1;
          true
        }
      }
      _ => {
        slots.insert(key.to_string(), Slot { started: now, count: 1 });
        true
      }
    }
  }
}
