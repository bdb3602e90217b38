//! [`SqliteWarehouse`] — the SQLite implementation of [`Warehouse`].

use std::{
  collections::{BTreeMap, BTreeSet},
  path::Path,
  sync::Arc,
};

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use starload_core::{
  batch::BatchSize,
  date_key::{DateKey, calendar},
  dimension::DimensionBatch,
  directory::{KeyDirectory, KeyDirectoryBuilder},
  entity::{EntityType, FactKind, SurrogateKey},
  fact::FactRecord,
  integrity::IntegrityReport,
  resolve::FactResolver,
  stats::{DimensionLoad, DimensionStats, FactLoadReport},
  store::Warehouse,
};
use tracing::{debug, info};

use crate::{
  Error, Result, calendar as dim_date, dimension,
  encode::encode_dt,
  fact, integrity,
  schema::{SCHEMA, TRUNCATE_ORDER, dimension_table, fact_table},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A star-schema warehouse backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory warehouse — useful for testing.
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

  /// The persisted surrogate key for a business key, if any.
  pub async fn dimension_key(
    &self,
    entity: EntityType,
    business_key: &str,
  ) -> Result<Option<SurrogateKey>> {
    let table = dimension_table(entity);
    let sql = format!(
      "SELECT {} FROM {} WHERE {} = ?1",
      table.key, table.name, table.business_key
    );
    let business_key = business_key.to_owned();
    let key: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, [business_key], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;
    Ok(key.map(SurrogateKey))
  }

  /// Number of persisted rows in the fact table for `kind`.
  pub async fn fact_count(&self, kind: FactKind) -> Result<u64> {
    let (table, _) = fact_table(kind);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count.unsigned_abs())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = Error;

  async fn load_dimensions(
    &self,
    batches: Vec<DimensionBatch>,
    batch_size: BatchSize,
  ) -> Result<DimensionLoad> {
    let now = encode_dt(Utc::now());

    let load = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut builder = KeyDirectoryBuilder::default();
        let mut stats = BTreeMap::<EntityType, DimensionStats>::new();

        for batch in &batches {
          let entity = batch.entity;
          stats.entry(entity).or_default();

          for (n, chunk) in batch.records.chunks(batch_size.get()).enumerate() {
            let outcome = dimension::upsert_batch(&tx, entity, chunk, &now)?;
            debug!(
              %entity,
              chunk = n,
              inserted = outcome.stats.inserted,
              updated = outcome.stats.updated,
              failed = outcome.stats.failed,
              "dimension chunk processed"
            );
            builder.merge(entity, outcome.keys);
            *stats.entry(entity).or_default() += outcome.stats;
          }
        }

        tx.commit()?;
        Ok(DimensionLoad { directory: builder.freeze(), stats })
      })
      .await?;

    for (entity, stats) in &load.stats {
      info!(
        %entity,
        processed = stats.processed,
        inserted = stats.inserted,
        updated = stats.updated,
        failed = stats.failed,
        "dimension loaded"
      );
    }
    Ok(load)
  }

  async fn populate_calendar(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
    let days = calendar(start, end)?;
    let total = days.len();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = dim_date::insert_days(&tx, &days)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    info!(%start, %end, total, inserted, "date dimension populated");
    Ok(inserted)
  }

  async fn missing_date_keys(&self, keys: Vec<DateKey>) -> Result<Vec<DateKey>> {
    let missing = self
      .conn
      .call(move |conn| Ok(dim_date::missing_keys(conn, keys)?))
      .await?;
    Ok(missing)
  }

  async fn load_facts(
    &self,
    facts: Vec<FactRecord>,
    directory: Arc<KeyDirectory>,
    batch_size: BatchSize,
  ) -> Result<FactLoadReport> {
    let now = encode_dt(Utc::now());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let mut resolver = FactResolver::default();
        let kinds = facts.iter().map(FactRecord::kind).collect::<BTreeSet<_>>();
        for kind in kinds {
          resolver.extend_existing(kind, fact::existing_business_keys(&tx, kind)?);
        }

        let mut report = FactLoadReport::default();
        for chunk in facts.chunks(batch_size.get()) {
          report += fact::load_batch(&tx, chunk, &directory, &mut resolver, &now)?;
        }

        tx.commit()?;
        Ok(report)
      })
      .await?;

    for (kind, stats) in &report.stats {
      info!(
        %kind,
        processed = stats.total_processed,
        loaded = stats.successfully_loaded,
        failed = stats.failed_validation,
        duplicates = stats.duplicate_count,
        "facts loaded"
      );
    }
    Ok(report)
  }

  async fn check_referential_integrity(&self) -> Result<IntegrityReport> {
    let report = self
      .conn
      .call(|conn| Ok(integrity::check(conn)?))
      .await?;
    Ok(report)
  }

  async fn truncate_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        for table in TRUNCATE_ORDER {
          tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    info!("warehouse truncated for full reload");
    Ok(())
  }
}
