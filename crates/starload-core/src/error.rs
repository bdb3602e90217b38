//! Error types for `starload-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid batch size {0}: must be between 1 and {max}", max = crate::batch::BatchSize::MAX)]
  InvalidBatchSize(usize),

  #[error("invalid date key: {0}")]
  InvalidDateKey(i64),

  #[error("invalid calendar range: {start} is not before {end}")]
  InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
