//! Time-windowed visit analytics.
//!
//! Window boundaries follow the admin's wall clock: "today" starts at local
//! midnight, "week" at the most recent Sunday 00:00 local, "month" at the
//! first of the current month 00:00 local. The boundaries are computed from
//! a caller-supplied local "now" so the arithmetic is testable at fixed
//! instants; the server passes `Local::now()`.

use chrono::{DateTime, Datelike as _, Local, NaiveDate, NaiveTime, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::{
  discipline::Discipline,
  store::VisitorStore,
  visit::VisitWithIdentity,
};

/// How many joined visits the recent-activity feed carries.
pub const RECENT_ACTIVITY_LIMIT: usize = 20;

// ─── Window boundaries ───────────────────────────────────────────────────────

/// The three aggregation boundaries, as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
  pub today: DateTime<Utc>,
  pub week:  DateTime<Utc>,
  pub month: DateTime<Utc>,
}

impl WindowBounds {
  /// Boundaries for the day, week, and month containing `now`.
  pub fn at(now: DateTime<Local>) -> Self {
    let date = now.date_naive();
    let days_since_sunday =
      i64::from(date.weekday().num_days_from_sunday());
    let week_date = date - chrono::Duration::days(days_since_sunday);
    let month_date = date.with_day(1).unwrap_or(date);

    Self {
      today: local_midnight(date),
      week:  local_midnight(week_date),
      month: local_midnight(month_date),
    }
  }
}

/// Local midnight of `date` as a UTC instant. A midnight erased by a DST
/// gap falls back to the naive-UTC reading.
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
  let naive = date.and_time(NaiveTime::MIN);
  match naive.and_local_timezone(Local).earliest() {
    Some(dt) => dt.with_timezone(&Utc),
    None => Utc.from_utc_datetime(&naive),
  }
}

// ─── Summary types ───────────────────────────────────────────────────────────

/// One row of the discipline breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineCount {
  pub discipline: Discipline,
  pub count:      u64,
}

/// The admin analytics read model — never stored, always derived.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
  pub today_count:          u64,
  pub week_count:           u64,
  pub month_count:          u64,
  pub discipline_breakdown: Vec<DisciplineCount>,
  pub recent_activity:      Vec<VisitWithIdentity>,
}

/// Assemble the summary from granular store operations.
pub async fn summarize<S: VisitorStore>(
  store: &S,
  bounds: WindowBounds,
) -> Result<AnalyticsSummary, S::Error> {
  let today_count = store.count_visits_since(bounds.today).await?;
  let week_count = store.count_visits_since(bounds.week).await?;
  let month_count = store.count_visits_since(bounds.month).await?;
  let discipline_breakdown = store.discipline_breakdown().await?;
  let recent_activity = store.recent_activity(RECENT_ACTIVITY_LIMIT).await?;

  Ok(AnalyticsSummary {
    today_count,
    week_count,
    month_count,
    discipline_breakdown,
    recent_activity,
  })
}

/// Count snapshot membership per enumeration member, in enumeration order.
/// Shared by store backends so the breakdown always covers every
/// discipline, including zero-count ones.
pub fn breakdown_from_snapshots<'a, I>(snapshots: I) -> Vec<DisciplineCount>
where
  I: IntoIterator<Item = &'a [Discipline]>,
{
  let members: Vec<Discipline> = Discipline::iter().collect();
  let mut counts = vec![0u64; members.len()];
  for snapshot in snapshots {
    for d in snapshot {
      if let Some(idx) = members.iter().position(|m| m == d) {
        counts[idx] += 1;
      }
    }
  }
  members
    .into_iter()
    .zip(counts)
    .map(|(discipline, count)| DisciplineCount { discipline, count })
    .collect()
}
