//! The visitor PIN credential.
//!
//! PINs are stored only as argon2 PHC strings with a freshly generated
//! random salt per hash. Verification rehashes the supplied PIN against the
//! stored salt; the hash is never reversed and plaintext is never persisted.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// A salted one-way hash of a visitor's 4-digit PIN, in PHC string format
/// (`$argon2id$v=19$…`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinCredential(String);

impl PinCredential {
  /// Hash a (pre-validated) PIN with a fresh random salt.
  pub fn hash_pin(pin: &str) -> Result<Self> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(pin.as_bytes(), &salt)
      .map_err(|e| Error::CredentialHash(e.to_string()))?;
    Ok(Self(hash.to_string()))
  }

  /// Rebuild from a PHC string read back out of storage.
  pub fn from_phc(phc: String) -> Self {
    Self(phc)
  }

  /// The PHC string, for persistence only. Never serialise this into an API
  /// response.
  pub fn as_phc(&self) -> &str {
    &self.0
  }

  /// Check a candidate PIN against the stored hash. An unparsable stored
  /// hash verifies as false rather than erroring.
  pub fn verify(&self, pin: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(&self.0) else {
      return false;
    };
    Argon2::default()
      .verify_password(pin.as_bytes(), &parsed)
      .is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let cred = PinCredential::hash_pin("1234").unwrap();
    assert!(cred.verify("1234"));
    assert!(!cred.verify("9999"));
  }

  #[test]
  fn each_hash_gets_a_fresh_salt() {
    let a = PinCredential::hash_pin("1234").unwrap();
    let b = PinCredential::hash_pin("1234").unwrap();
    assert_ne!(a.as_phc(), b.as_phc());
    assert!(a.verify("1234") && b.verify("1234"));
  }

  #[test]
  fn garbage_phc_verifies_false() {
    let cred = PinCredential::from_phc("not-a-phc-string".into());
    assert!(!cred.verify("1234"));
  }
}
