//! Error type for `starload-store-sqlite`.
//!
//! Only fatal conditions surface here. Record-level problems (constraint
//! violations, unresolvable references) are counted in load statistics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] starload_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Record-level classification ─────────────────────────────────────────────

/// Outcome of a failed per-record statement.
pub(crate) enum RecordError {
  /// The record is skipped and counted; the batch carries on.
  Skipped(String),
  /// The enclosing operation must abort and roll back.
  Fatal(rusqlite::Error),
}

impl From<rusqlite::Error> for RecordError {
  fn from(err: rusqlite::Error) -> Self {
    if is_record_level(&err) {
      Self::Skipped(err.to_string())
    } else {
      Self::Fatal(err)
    }
  }
}

/// Whether a SQLite error is caused by the values of a single record rather
/// than by the connection or transaction.
pub(crate) fn is_record_level(err: &rusqlite::Error) -> bool {
  match err {
    rusqlite::Error::SqliteFailure(e, _) => matches!(
      e.code,
      rusqlite::ErrorCode::ConstraintViolation
        | rusqlite::ErrorCode::TypeMismatch
        | rusqlite::ErrorCode::TooBig
    ),
    rusqlite::Error::ToSqlConversionFailure(_)
    | rusqlite::Error::IntegralValueOutOfRange(..)
    | rusqlite::Error::FromSqlConversionFailure(..)
    | rusqlite::Error::InvalidColumnType(..) => true,
    _ => false,
  }
}
