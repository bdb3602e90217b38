//! The `Warehouse` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `starload-store-sqlite`). The pipeline orchestrator depends on this
//! abstraction, not on any concrete backend.

use std::{future::Future, sync::Arc};

use chrono::NaiveDate;

use crate::{
  batch::BatchSize,
  date_key::DateKey,
  dimension::DimensionBatch,
  directory::KeyDirectory,
  fact::FactRecord,
  integrity::IntegrityReport,
  stats::{DimensionLoad, FactLoadReport},
};

/// Abstraction over a star-schema warehouse backend.
///
/// Each loading method is one unit of work with its own transaction scope.
/// Per-record problems are reported through the returned statistics; an
/// `Err` means the whole operation failed and was rolled back.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Dimensions ────────────────────────────────────────────────────────

  /// Upsert every batch (SCD Type 1) inside a single transaction and return
  /// the frozen surrogate key directory.
  ///
  /// Records that fail individually are logged and left out of the
  /// directory. A connection or commit failure rolls back every batch of the
  /// call.
  fn load_dimensions(
    &self,
    batches: Vec<DimensionBatch>,
    batch_size: BatchSize,
  ) -> impl Future<Output = Result<DimensionLoad, Self::Error>> + Send + '_;

  /// Insert every date in `start..=end` into the date dimension, skipping
  /// keys already present. Returns the number of rows inserted.
  fn populate_calendar(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Return the subset of `keys` that has no row in the date dimension.
  fn missing_date_keys(
    &self,
    keys: Vec<DateKey>,
  ) -> impl Future<Output = Result<Vec<DateKey>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Resolve and insert facts inside a single transaction.
  ///
  /// Duplicate and unresolvable facts are rejected and counted, never
  /// raised.
  fn load_facts(
    &self,
    facts: Vec<FactRecord>,
    directory: Arc<KeyDirectory>,
    batch_size: BatchSize,
  ) -> impl Future<Output = Result<FactLoadReport, Self::Error>> + Send + '_;

  // ── Validation & maintenance ──────────────────────────────────────────

  /// Count orphaned foreign-key references in every fact table.
  fn check_referential_integrity(
    &self,
  ) -> impl Future<Output = Result<IntegrityReport, Self::Error>> + Send + '_;

  /// Delete every fact and dimension row ahead of a full reload.
  fn truncate_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
