//! [`SqliteStore`] — the SQLite implementation of [`VisitorStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use foyer_core::{
  analytics::{DisciplineCount, breakdown_from_snapshots},
  identity::{Identity, IdentityOverview, NewIdentity, ProfileChanges},
  store::{IdentityQuery, IdentitySort, VisitFilter, VisitorStore},
  visit::{DUPLICATE_WINDOW_SECS, Visit, VisitWithIdentity},
};

use crate::{
  Error, Result,
  encode::{
    RawIdentity, RawJoinedVisit, RawOverview, RawVisit, decode_disciplines,
    discipline_like_pattern, encode_disciplines, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Outcome of an in-closure invariant check, carried out of the database
/// thread so the caller can attach the identity id to the error.
enum Denied {
  NotFound,
  Duplicate,
  EmailTaken,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Foyer visitor store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised onto the connection's worker thread, so a probe and the
/// write that depends on it run back to back when issued from one closure.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Rewrite a visit's timestamp. Test-only clock control for exercising
  /// the suppression window and analytics boundaries without sleeping.
  #[cfg(test)]
  pub(crate) async fn set_visit_time(
    &self,
    visit_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let at_str = encode_dt(at);
    let id_str = encode_uuid(visit_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE visits SET recorded_at = ?1 WHERE visit_id = ?2",
          rusqlite::params![at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── VisitorStore impl ───────────────────────────────────────────────────────

impl VisitorStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn register(&self, input: NewIdentity) -> Result<Identity> {
    let now = Utc::now();
    let identity = Identity {
      identity_id:    Uuid::new_v4(),
      email:          input.email,
      name:           input.name,
      preferred_name: input.preferred_name,
      workplace:      input.workplace,
      disciplines:    input.disciplines,
      credential:     Some(input.credential),
      created_at:     now,
      updated_at:     now,
    };

    let id_str     = encode_uuid(identity.identity_id);
    let email      = identity.email.clone();
    let name       = identity.name.clone();
    let preferred  = identity.preferred_name.clone();
    let workplace  = identity.workplace.clone();
    let disc_str   = encode_disciplines(&identity.disciplines)?;
    let cred_str   = identity.credential.as_ref().map(|c| c.as_phc().to_owned());
    let at_str     = encode_dt(identity.created_at);
    let upd_str    = encode_dt(identity.updated_at);

    // The uniqueness probe and the insert run in one closure, back to back
    // on the connection's worker thread; the UNIQUE index backstops them.
    let outcome: std::result::Result<(), Denied> = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM identities WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(Err(Denied::EmailTaken));
        }

        conn.execute(
          "INSERT INTO identities (
             identity_id, email, name, preferred_name, workplace,
             disciplines, credential, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, email, name, preferred, workplace,
            disc_str, cred_str, at_str, upd_str,
          ],
        )?;
        Ok(Ok(()))
      })
      .await?;

    match outcome {
      Ok(()) => Ok(identity),
      Err(_) => Err(Error::EmailTaken(identity.email)),
    }
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let id_str = encode_uuid(id);
    let sql = format!(
      "SELECT {} FROM identities WHERE identity_id = ?1",
      RawIdentity::COLUMNS
    );

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawIdentity::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
    let email = email.to_owned();
    let sql = format!(
      "SELECT {} FROM identities WHERE email = ?1",
      RawIdentity::COLUMNS
    );

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![email], RawIdentity::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn find_by_pin(&self, pin: &str) -> Result<Option<Identity>> {
    // No index can serve a salted hash; fetch the credentialed rows and
    // verify each. Acceptable at guest-book scale.
    let sql = format!(
      "SELECT {} FROM identities WHERE credential IS NOT NULL",
      RawIdentity::COLUMNS
    );

    let raws: Vec<RawIdentity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    for raw in raws {
      let identity = raw.into_identity()?;
      if let Some(cred) = &identity.credential
        && cred.verify(pin)
      {
        return Ok(Some(identity));
      }
    }
    Ok(None)
  }

  async fn update_profile(
    &self,
    id: Uuid,
    changes: ProfileChanges,
  ) -> Result<Identity> {
    let id_str     = encode_uuid(id);
    let name       = changes.name.clone();
    let preferred  = changes.preferred_name.clone();
    let workplace  = changes.workplace.clone();
    let disc_str   = encode_disciplines(&changes.disciplines)?;
    let cred_str   = changes.credential.as_ref().map(|c| c.as_phc().to_owned());
    let now        = Utc::now();
    let now_str    = encode_dt(now);
    let select_sql = format!(
      "SELECT {} FROM identities WHERE identity_id = ?1",
      RawIdentity::COLUMNS
    );

    let outcome: std::result::Result<RawIdentity, Denied> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &select_sql,
            rusqlite::params![id_str],
            RawIdentity::from_row,
          )
          .optional()?;

        let Some(raw) = raw else {
          return Ok(Err(Denied::NotFound));
        };

        // COALESCE keeps the stored credential when no new PIN was given.
        conn.execute(
          "UPDATE identities
           SET name = ?1, preferred_name = ?2, workplace = ?3,
               disciplines = ?4, credential = COALESCE(?5, credential),
               updated_at = ?6
           WHERE identity_id = ?7",
          rusqlite::params![
            name, preferred, workplace, disc_str, cred_str, now_str, id_str,
          ],
        )?;
        Ok(Ok(raw))
      })
      .await?;

    let original = match outcome {
      Ok(raw) => raw.into_identity()?,
      Err(_) => return Err(Error::IdentityNotFound(id)),
    };

    Ok(Identity {
      identity_id:    original.identity_id,
      email:          original.email,
      name:           changes.name,
      preferred_name: changes.preferred_name,
      workplace:      changes.workplace,
      disciplines:    changes.disciplines,
      credential:     changes.credential.or(original.credential),
      created_at:     original.created_at,
      updated_at:     now,
    })
  }

  async fn list_identities(
    &self,
    query: &IdentityQuery,
  ) -> Result<Vec<IdentityOverview>> {
    let search_pattern =
      query.search.as_ref().map(|s| format!("%{}%", s.to_lowercase()));
    // SQLite reads LIMIT -1 as "no limit".
    let limit_val = query.limit.map(|l| l as i64).unwrap_or(-1);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let order = match query.sort {
      IdentitySort::Recent => "last_visit IS NULL, last_visit DESC",
      IdentitySort::Name => "LOWER(i.name) ASC",
      IdentitySort::Visits => "visit_count DESC",
    };
    let where_clause = if search_pattern.is_some() {
      "WHERE (LOWER(i.name) LIKE ?1 OR LOWER(i.email) LIKE ?1)"
    } else {
      ""
    };

    let sql = format!(
      "SELECT i.identity_id, i.email, i.name, i.preferred_name, i.workplace,
              i.disciplines, i.credential, i.created_at, i.updated_at,
              COUNT(v.visit_id) AS visit_count,
              MAX(v.recorded_at) AS last_visit
       FROM identities i
       LEFT JOIN visits v ON v.identity_id = i.identity_id
       {where_clause}
       GROUP BY i.identity_id
       ORDER BY {order}
       LIMIT ?2 OFFSET ?3"
    );

    let raws: Vec<RawOverview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![search_pattern.as_deref(), limit_val, offset_val],
            RawOverview::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOverview::into_overview).collect()
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn record_visit(
    &self,
    identity_id: Uuid,
    reason: String,
  ) -> Result<Visit> {
    let visit_id = Uuid::new_v4();
    let now = Utc::now();
    let cutoff =
      now - chrono::Duration::seconds(DUPLICATE_WINDOW_SECS);

    let id_str       = encode_uuid(identity_id);
    let visit_id_str = encode_uuid(visit_id);
    let now_str      = encode_dt(now);
    let cutoff_str   = encode_dt(cutoff);
    let reason_owned = reason.clone();

    // Existence check, suppression probe, insert, and timestamp refresh all
    // run in one closure, serialised on the connection's worker thread.
    let outcome: std::result::Result<String, Denied> = self
      .conn
      .call(move |conn| {
        let disciplines: Option<String> = conn
          .query_row(
            "SELECT disciplines FROM identities WHERE identity_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(disciplines_json) = disciplines else {
          return Ok(Err(Denied::NotFound));
        };

        let recent: bool = conn
          .query_row(
            "SELECT 1 FROM visits
             WHERE identity_id = ?1 AND recorded_at >= ?2
             LIMIT 1",
            rusqlite::params![id_str, cutoff_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if recent {
          return Ok(Err(Denied::Duplicate));
        }

        conn.execute(
          "INSERT INTO visits (visit_id, identity_id, recorded_at, reason, disciplines)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            visit_id_str, id_str, now_str, reason_owned, disciplines_json,
          ],
        )?;
        conn.execute(
          "UPDATE identities SET updated_at = ?1 WHERE identity_id = ?2",
          rusqlite::params![now_str, id_str],
        )?;
        Ok(Ok(disciplines_json))
      })
      .await?;

    match outcome {
      Ok(disciplines_json) => Ok(Visit {
        visit_id,
        identity_id,
        recorded_at: now,
        reason,
        disciplines: decode_disciplines(&disciplines_json)?,
      }),
      Err(Denied::Duplicate) => Err(Error::DuplicateVisit(identity_id)),
      Err(_) => Err(Error::IdentityNotFound(identity_id)),
    }
  }

  async fn latest_visit(&self, identity_id: Uuid) -> Result<Option<Visit>> {
    let id_str = encode_uuid(identity_id);
    let sql = format!(
      "SELECT {} FROM visits WHERE identity_id = ?1
       ORDER BY recorded_at DESC LIMIT 1",
      RawVisit::COLUMNS
    );

    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawVisit::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn visits_for_identity(
    &self,
    identity_id: Uuid,
    limit: Option<usize>,
  ) -> Result<Vec<Visit>> {
    let id_str = encode_uuid(identity_id);
    let limit_val = limit.map(|l| l as i64).unwrap_or(-1);
    let sql = format!(
      "SELECT {} FROM visits WHERE identity_id = ?1
       ORDER BY recorded_at DESC LIMIT ?2",
      RawVisit::COLUMNS
    );

    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit_val], RawVisit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  // ── Aggregation ───────────────────────────────────────────────────────────

  async fn count_visits_since(&self, since: DateTime<Utc>) -> Result<u64> {
    let since_str = encode_dt(since);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM visits WHERE recorded_at >= ?1",
          rusqlite::params![since_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn discipline_breakdown(&self) -> Result<Vec<DisciplineCount>> {
    let snapshots_json: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT disciplines FROM visits")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let snapshots = snapshots_json
      .iter()
      .map(|s| decode_disciplines(s))
      .collect::<Result<Vec<_>>>()?;

    Ok(breakdown_from_snapshots(snapshots.iter().map(Vec::as_slice)))
  }

  async fn recent_activity(
    &self,
    limit: usize,
  ) -> Result<Vec<VisitWithIdentity>> {
    let limit_val = limit as i64;
    let sql = format!(
      "SELECT {}, i.name, i.email
       FROM visits v
       JOIN identities i ON i.identity_id = v.identity_id
       ORDER BY v.recorded_at DESC
       LIMIT ?1",
      joined_visit_columns()
    );

    let raws: Vec<RawJoinedVisit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawJoinedVisit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawJoinedVisit::into_joined).collect()
  }

  async fn export_visits(
    &self,
    filter: &VisitFilter,
  ) -> Result<Vec<VisitWithIdentity>> {
    // Conditions are assembled with sequential placeholders and bound from
    // a matching vector, so the statement never sees an unused parameter.
    let mut conds: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(start) = filter.start {
      binds.push(encode_dt(start));
      conds.push(format!("v.recorded_at >= ?{}", binds.len()));
    }
    if let Some(end) = filter.end {
      binds.push(encode_dt(end));
      conds.push(format!("v.recorded_at <= ?{}", binds.len()));
    }
    if let Some(discipline) = filter.discipline {
      binds.push(discipline_like_pattern(discipline));
      conds.push(format!("v.disciplines LIKE ?{}", binds.len()));
    }
    if let Some(search) = &filter.search {
      binds.push(format!("%{}%", search.to_lowercase()));
      conds.push(format!(
        "(LOWER(i.name) LIKE ?{n} OR LOWER(i.email) LIKE ?{n})",
        n = binds.len()
      ));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let sql = format!(
      "SELECT {}, i.name, i.email
       FROM visits v
       JOIN identities i ON i.identity_id = v.identity_id
       {where_clause}
       ORDER BY v.recorded_at DESC",
      joined_visit_columns()
    );

    let raws: Vec<RawJoinedVisit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(binds.iter()),
            RawJoinedVisit::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawJoinedVisit::into_joined).collect()
  }
}

/// `visits` columns with the `v.` alias, for the joined queries.
fn joined_visit_columns() -> String {
  RawVisit::COLUMNS
    .split(", ")
    .map(|c| format!("v.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}
