//! Dimension upsert engine.
//!
//! For each record: look the business key up in durable state, overwrite the
//! mutable attributes when found (SCD Type 1, key unchanged), otherwise insert
//! and take the identity-generated key straight from `RETURNING`. A failure
//! on one record skips that record only; anything that is not attributable
//! to the record aborts the enclosing transaction.

use std::iter;

use rusqlite::{Connection, OptionalExtension as _, params_from_iter, types::Value};
use starload_core::{
  dimension::DimensionRecord,
  entity::{EntityType, SurrogateKey},
  stats::{DimensionStats, RecordFailure, UpsertOutcome},
};
use tracing::warn;

use crate::{
  encode::{DimensionRow, encode_dimension},
  error::RecordError,
  schema::{DimensionTable, dimension_table},
};

/// Result of upserting one chunk of records.
#[derive(Debug, Default)]
pub struct BatchOutcome {
  /// `business_key -> surrogate key` for every record that succeeded.
  pub keys:     Vec<(String, SurrogateKey)>,
  pub stats:    DimensionStats,
  pub failures: Vec<RecordFailure>,
}

/// Upsert one chunk of `entity` records.
///
/// Returns `Err` only for fatal errors; per-record failures are collected in
/// the outcome.
pub fn upsert_batch(
  conn: &Connection,
  entity: EntityType,
  records: &[DimensionRecord],
  now: &str,
) -> rusqlite::Result<BatchOutcome> {
  let mut outcome = BatchOutcome::default();

  for record in records {
    let result = match upsert_record(conn, entity, record, now) {
      Ok(upserted) => Ok(upserted),
      Err(RecordError::Fatal(err)) => return Err(err),
      Err(RecordError::Skipped(reason)) => Err(RecordFailure {
        business_key: record.business_key().to_owned(),
        reason,
      }),
    };
    outcome.stats.record(&result);

    match result {
      Ok(upserted) => outcome
        .keys
        .push((record.business_key().to_owned(), upserted.key())),
      Err(failure) => {
        warn!(
          %entity,
          business_key = %failure.business_key,
          reason = %failure.reason,
          "skipping dimension record"
        );
        outcome.failures.push(failure);
      }
    }
  }

  Ok(outcome)
}

fn upsert_record(
  conn: &Connection,
  entity: EntityType,
  record: &DimensionRecord,
  now: &str,
) -> Result<UpsertOutcome, RecordError> {
  if record.entity_type() != entity {
    return Err(RecordError::Skipped(format!(
      "{} record submitted in {entity} batch",
      record.entity_type()
    )));
  }

  let row = encode_dimension(record);
  if row.business_key.trim().is_empty() {
    return Err(RecordError::Skipped("empty business key".to_owned()));
  }

  let table = dimension_table(entity);
  let existing: Option<i64> = conn
    .prepare_cached(&format!(
      "SELECT {} FROM {} WHERE {} = ?1",
      table.key, table.name, table.business_key
    ))?
    .query_row([&row.business_key], |r| r.get(0))
    .optional()?;

  match existing {
    Some(key) => {
      update(conn, table, &row, key, now)?;
      Ok(UpsertOutcome::Updated(SurrogateKey(key)))
    }
    None => Ok(UpsertOutcome::Inserted(SurrogateKey(insert(conn, table, &row, now)?))),
  }
}

/// Overwrite every mutable attribute of the row keyed by `key`.
fn update(
  conn: &Connection,
  table: DimensionTable,
  row: &DimensionRow,
  key: i64,
  now: &str,
) -> rusqlite::Result<()> {
  let n = row.attributes.len();
  let assignments = row
    .attributes
    .iter()
    .enumerate()
    .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "UPDATE {} SET {assignments}, updated_at = ?{} WHERE {} = ?{}",
    table.name,
    n + 1,
    table.key,
    n + 2
  );

  let params = row
    .values()
    .cloned()
    .chain([Value::Text(now.to_owned()), Value::Integer(key)]);
  conn.prepare_cached(&sql)?.execute(params_from_iter(params))?;
  Ok(())
}

/// Insert a new row and return its generated key in the same statement.
fn insert(
  conn: &Connection,
  table: DimensionTable,
  row: &DimensionRow,
  now: &str,
) -> rusqlite::Result<i64> {
  let columns = iter::once(table.business_key)
    .chain(row.attributes.iter().map(|(column, _)| *column))
    .chain(["created_at", "updated_at"])
    .collect::<Vec<_>>();
  let placeholders = (1..=columns.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "INSERT INTO {} ({}) VALUES ({placeholders}) RETURNING {}",
    table.name,
    columns.join(", "),
    table.key
  );

  let params = iter::once(Value::Text(row.business_key.clone()))
    .chain(row.values().cloned())
    .chain([Value::Text(now.to_owned()), Value::Text(now.to_owned())]);
  conn
    .prepare_cached(&sql)?
    .query_row(params_from_iter(params), |r| r.get(0))
}
