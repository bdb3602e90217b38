//! Calendar date keys.
//!
//! The date dimension is keyed directly by a `YYYYMMDD` integer that is
//! computed from the date, never assigned by the store. There is no upsert
//! step for dates; the fact phase only checks that a key is well formed and,
//! after loading, that it exists in `dim_date`.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A `YYYYMMDD`-encoded calendar date.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DateKey(u32);

impl DateKey {
  pub fn from_date(date: NaiveDate) -> Self {
    let year = date.year().max(0) as u32;
    Self(year * 10_000 + date.month() * 100 + date.day())
  }

  /// Interpret a raw key from an incoming record.
  ///
  /// Absent keys are conventionally encoded as `0` (or any non-positive
  /// value) and yield `Ok(None)`. A positive value that does not decode to a
  /// real calendar date is an error.
  pub fn from_raw(raw: i64) -> Result<Option<Self>> {
    if raw <= 0 {
      return Ok(None);
    }
    let key = u32::try_from(raw).map_err(|_| Error::InvalidDateKey(raw))?;
    let year = i32::try_from(raw / 10_000).map_err(|_| Error::InvalidDateKey(raw))?;
    let month = (key / 100) % 100;
    let day = key % 100;

    NaiveDate::from_ymd_opt(year, month, day)
      .map(|_| Some(Self(key)))
      .ok_or(Error::InvalidDateKey(raw))
  }

  pub fn get(self) -> u32 { self.0 }
}

impl From<NaiveDate> for DateKey {
  fn from(date: NaiveDate) -> Self { Self::from_date(date) }
}

impl fmt::Display for DateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Calendar rows ───────────────────────────────────────────────────────────

/// One row of the date dimension with its derived calendar attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
  pub key:          DateKey,
  pub date:         NaiveDate,
  pub year:         i32,
  pub quarter:      u32,
  pub month:        u32,
  pub month_name:   &'static str,
  pub day_of_month: u32,
  /// ISO day of week, Monday = 1.
  pub day_of_week:  u32,
  pub day_name:     &'static str,
  /// ISO week number.
  pub week_of_year: u32,
  pub is_weekend:   bool,
}

impl CalendarDay {
  pub fn new(date: NaiveDate) -> Self {
    let weekday = date.weekday();
    Self {
      key: DateKey::from_date(date),
      date,
      year: date.year(),
      quarter: (date.month() - 1) / 3 + 1,
      month: date.month(),
      month_name: month_name(date.month()),
      day_of_month: date.day(),
      day_of_week: weekday.number_from_monday(),
      day_name: day_name(weekday),
      week_of_year: date.iso_week().week(),
      is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
    }
  }
}

/// Every calendar day from `start` to `end`, inclusive.
pub fn calendar(start: NaiveDate, end: NaiveDate) -> Result<Vec<CalendarDay>> {
  if start >= end {
    return Err(Error::InvalidDateRange { start, end });
  }
  Ok(
    start
      .iter_days()
      .take_while(|d| *d <= end)
      .map(CalendarDay::new)
      .collect(),
  )
}

fn month_name(month: u32) -> &'static str {
  match month {
    1 => "January",
    2 => "February",
    3 => "March",
    4 => "April",
    5 => "May",
    6 => "June",
    7 => "July",
    8 => "August",
    9 => "September",
    10 => "October",
    11 => "November",
    _ => "December",
  }
}

fn day_name(weekday: Weekday) -> &'static str {
  match weekday {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}
