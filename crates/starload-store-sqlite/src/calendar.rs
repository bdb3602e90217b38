//! Date dimension population and lookup.

use rusqlite::Connection;
use starload_core::date_key::{CalendarDay, DateKey};

use crate::encode::encode_date;

/// Insert `days`, skipping keys already present. Returns the number of new
/// rows.
pub fn insert_days(conn: &Connection, days: &[CalendarDay]) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR IGNORE INTO dim_date
       (date_key, full_date, year, quarter, month, month_name, day_of_month,
        day_of_week, day_name, week_of_year, is_weekend)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
  )?;

  let mut inserted = 0;
  for day in days {
    inserted += stmt.execute(rusqlite::params![
      day.key.get(),
      encode_date(day.date),
      day.year,
      day.quarter,
      day.month,
      day.month_name,
      day.day_of_month,
      day.day_of_week,
      day.day_name,
      day.week_of_year,
      day.is_weekend,
    ])?;
  }
  Ok(inserted)
}

/// The subset of `keys` with no row in `dim_date`, deduplicated and sorted.
pub fn missing_keys(conn: &Connection, mut keys: Vec<DateKey>) -> rusqlite::Result<Vec<DateKey>> {
  keys.sort_unstable();
  keys.dedup();

  let mut stmt = conn.prepare_cached("SELECT EXISTS(SELECT 1 FROM dim_date WHERE date_key = ?1)")?;
  let mut missing = Vec::new();
  for key in keys {
    let present: bool = stmt.query_row([key.get()], |r| r.get(0))?;
    if !present {
      missing.push(key);
    }
  }
  Ok(missing)
}
