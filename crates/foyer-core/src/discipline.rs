//! The fixed discipline enumeration.
//!
//! The wire literals below are the canonical set; validation, the visit
//! snapshot, the analytics breakdown, and the CSV export all use this one
//! enum.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::{Error, Result};

/// What a visitor works on. Serialised with the exact labels the clients
/// send, including the slashed ones.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
)]
pub enum Discipline {
  Software,
  Hardware,
  Art,
  Design,
  Fashion,
  #[serde(rename = "AI/ML")]
  AiMl,
  #[serde(rename = "Photographer/Videographer")]
  PhotographerVideographer,
  Other,
}

impl Discipline {
  /// The canonical wire/display label.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Software => "Software",
      Self::Hardware => "Hardware",
      Self::Art => "Art",
      Self::Design => "Design",
      Self::Fashion => "Fashion",
      Self::AiMl => "AI/ML",
      Self::PhotographerVideographer => "Photographer/Videographer",
      Self::Other => "Other",
    }
  }

  /// Parse a client-supplied label. Exact match only; anything outside the
  /// enumeration is rejected rather than coerced to `Other`.
  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "Software" => Ok(Self::Software),
      "Hardware" => Ok(Self::Hardware),
      "Art" => Ok(Self::Art),
      "Design" => Ok(Self::Design),
      "Fashion" => Ok(Self::Fashion),
      "AI/ML" => Ok(Self::AiMl),
      "Photographer/Videographer" => Ok(Self::PhotographerVideographer),
      "Other" => Ok(Self::Other),
      other => Err(Error::UnknownDiscipline(other.to_string())),
    }
  }

  /// Parse a whole submitted list, rejecting empty sets and unknown labels.
  pub fn parse_set(labels: &[String]) -> Result<Vec<Self>> {
    if labels.is_empty() {
      return Err(Error::NoDisciplines);
    }
    labels.iter().map(|l| Self::parse(l)).collect()
  }
}

impl std::fmt::Display for Discipline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn every_label_round_trips() {
    for d in Discipline::iter() {
      assert_eq!(Discipline::parse(d.label()).unwrap(), d);
    }
  }

  #[test]
  fn unknown_label_is_rejected() {
    let err = Discipline::parse("Creative").unwrap_err();
    assert!(matches!(err, Error::UnknownDiscipline(_)));
  }

  #[test]
  fn empty_set_is_rejected() {
    assert!(matches!(
      Discipline::parse_set(&[]),
      Err(Error::NoDisciplines)
    ));
  }

  #[test]
  fn serde_uses_wire_literals() {
    let json = serde_json::to_string(&Discipline::AiMl).unwrap();
    assert_eq!(json, "\"AI/ML\"");
    let json =
      serde_json::to_string(&Discipline::PhotographerVideographer).unwrap();
    assert_eq!(json, "\"Photographer/Videographer\"");
    let back: Discipline = serde_json::from_str("\"AI/ML\"").unwrap();
    assert_eq!(back, Discipline::AiMl);
  }
}
