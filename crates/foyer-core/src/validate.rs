//! Input validation and free-text sanitising.
//!
//! The sanitizer is an allowlist-light defence for text that later lands in
//! an admin dashboard: it strips angle brackets, `javascript:` scheme
//! prefixes, and inline `on*=` handler patterns. It is not a full HTML
//! sanitizer and does not try to be one.

use crate::{Error, Result};

/// Minimum trimmed length of a check-in reason.
pub const REASON_MIN: usize = 10;
/// Maximum trimmed length of a check-in reason.
pub const REASON_MAX: usize = 500;

/// Canonical form used for storage and comparison: trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
  raw.trim().to_lowercase()
}

/// Shape check on an already-normalized email. Deliberately loose; the email
/// is an identifier here, not a delivery address.
pub fn check_email(email: &str) -> Result<()> {
  let well_formed = email.len() >= 3
    && email.contains('@')
    && !email.starts_with('@')
    && !email.ends_with('@')
    && !email.contains(char::is_whitespace);
  if well_formed {
    Ok(())
  } else {
    Err(Error::InvalidEmail(email.to_string()))
  }
}

/// A PIN is exactly 4 ASCII decimal digits.
pub fn check_pin(pin: &str) -> Result<()> {
  if pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit()) {
    Ok(())
  } else {
    Err(Error::InvalidPin)
  }
}

/// Sanitize, trim, and bounds-check a check-in reason.
/// Length is counted in characters, after sanitising and trimming.
pub fn clean_reason(raw: &str) -> Result<String> {
  let cleaned = sanitize_text(raw);
  let trimmed = cleaned.trim();
  let len = trimmed.chars().count();
  if (REASON_MIN..=REASON_MAX).contains(&len) {
    Ok(trimmed.to_string())
  } else {
    Err(Error::ReasonLength(len))
  }
}

/// Sanitize and trim a display name; empty names are rejected.
pub fn clean_name(raw: &str) -> Result<String> {
  let cleaned = sanitize_text(raw);
  let trimmed = cleaned.trim();
  if trimmed.is_empty() {
    Err(Error::EmptyName)
  } else {
    Ok(trimmed.to_string())
  }
}

/// Sanitize and trim an optional free-text field; empty collapses to `None`.
pub fn clean_optional(raw: Option<&str>) -> Option<String> {
  let trimmed = sanitize_text(raw?.trim());
  let trimmed = trimmed.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}

/// Strip angle brackets, `javascript:` prefixes, and `on*=` handler
/// patterns from free text.
pub fn sanitize_text(raw: &str) -> String {
  let no_brackets: String =
    raw.chars().filter(|c| *c != '<' && *c != '>').collect();
  let no_scheme = remove_ascii_ci(&no_brackets, "javascript:");
  strip_event_handlers(&no_scheme)
}

/// Remove every ASCII-case-insensitive occurrence of `needle` from `s`.
/// The needle must be ASCII, so every match lies on char boundaries.
fn remove_ascii_ci(s: &str, needle: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut i = 0;
  while i < s.len() {
    let rest = &s[i..];
    if rest.len() >= needle.len()
      && rest.as_bytes()[..needle.len()]
        .eq_ignore_ascii_case(needle.as_bytes())
    {
      i += needle.len();
      continue;
    }
    let Some(ch) = rest.chars().next() else { break };
    out.push(ch);
    i += ch.len_utf8();
  }
  out
}

/// Drop `on<letters>=` tokens (e.g. `onclick=`, `ONLOAD =` without the
/// space) when they start at a word boundary. The token itself is removed;
/// surrounding text is kept.
fn strip_event_handlers(s: &str) -> String {
  let chars: Vec<char> = s.chars().collect();
  let mut out = String::with_capacity(s.len());
  let mut i = 0;
  while i < chars.len() {
    let at_boundary = i == 0 || !chars[i - 1].is_alphanumeric();
    if at_boundary
      && let Some(len) = matches_handler(&chars[i..])
    {
      i += len;
      continue;
    }
    out.push(chars[i]);
    i += 1;
  }
  out
}

/// If `chars` starts with `on<letters>=`, return the token length.
fn matches_handler(chars: &[char]) -> Option<usize> {
  if chars.len() < 4 {
    return None;
  }
  if !chars[0].eq_ignore_ascii_case(&'o') || !chars[1].eq_ignore_ascii_case(&'n')
  {
    return None;
  }
  let mut j = 2;
  while j < chars.len() && chars[j].is_ascii_alphabetic() {
    j += 1;
  }
  // Need at least one letter after "on", immediately followed by '='.
  if j > 2 && j < chars.len() && chars[j] == '=' {
    Some(j + 1)
  } else {
    None
  }
}
