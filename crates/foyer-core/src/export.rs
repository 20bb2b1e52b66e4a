//! CSV rendering for the admin export.
//!
//! Standard CSV quoting: every field is double-quote-enclosed with internal
//! double quotes doubled, rows separated by CRLF. Discipline snapshots are
//! joined with `"; "`. Row order is whatever the store returned (newest
//! first for the export query).

use crate::{discipline::Discipline, visit::VisitWithIdentity};

/// Column order of the export.
pub const CSV_HEADER: &str = "Timestamp,Name,Email,Disciplines,Reason";

/// Render joined visits as delimited text, header row first.
pub fn render_csv(rows: &[VisitWithIdentity]) -> String {
  let mut out = String::with_capacity(64 * (rows.len() + 1));
  out.push_str(CSV_HEADER);
  out.push_str("\r\n");

  for row in rows {
    let disciplines = row
      .visit
      .disciplines
      .iter()
      .map(Discipline::label)
      .collect::<Vec<_>>()
      .join("; ");

    let fields = [
      row.visit.recorded_at.to_rfc3339(),
      row.name.clone(),
      row.email.clone(),
      disciplines,
      row.visit.reason.clone(),
    ];
    let quoted: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&quoted.join(","));
    out.push_str("\r\n");
  }

  out
}

/// Enclose in double quotes, doubling internal quotes.
fn csv_field(value: &str) -> String {
  format!("\"{}\"", value.replace('"', "\"\""))
}
