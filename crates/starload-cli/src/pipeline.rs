//! The batch run: dimensions, then facts, then integrity.
//!
//! The two loading phases commit independently. Once the dimension phase has
//! committed, a fatal error in the fact phase leaves the dimension changes in
//! place and marks the run failed; nothing is rolled back across phases.

use std::{sync::Arc, time::Instant};

use starload_core::store::Warehouse;
use tracing::{error, info, warn};

use crate::{Error, PipelineConfig, Result, RunReport, TransformedData};

pub struct Pipeline<W> {
  warehouse: W,
  config:    PipelineConfig,
}

impl<W: Warehouse> Pipeline<W> {
  pub fn new(warehouse: W, config: PipelineConfig) -> Self { Self { warehouse, config } }

  pub fn warehouse(&self) -> &W { &self.warehouse }

  /// Load `data` end to end. Fatal errors are captured in the report rather
  /// than returned.
  pub async fn run(&self, data: TransformedData) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport::default();

    if let Err(err) = self.execute(data, &mut report).await {
      error!(error = %err, "pipeline run failed");
      report.success = false;
      report.error = Some(err.to_string());
    }

    report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    report.log_summary(self.config.quality_threshold);
    report
  }

  async fn execute(&self, data: TransformedData, report: &mut RunReport) -> Result<()> {
    let batch_size = self.config.batch_size()?;
    let wh = &self.warehouse;

    if self.config.reload {
      wh.truncate_all().await.map_err(Error::warehouse)?;
    }

    let calendar = &self.config.calendar;
    if calendar.populate {
      report.calendar_days_inserted = wh
        .populate_calendar(calendar.start, calendar.end)
        .await
        .map_err(Error::warehouse)?;
    }

    let date_keys = data.date_keys();
    let (dimensions, facts) = data.into_parts();

    // ── Phase 1: dimensions ───────────────────────────────────────────────
    info!(batches = dimensions.len(), "loading dimensions");
    let load = wh
      .load_dimensions(dimensions, batch_size)
      .await
      .map_err(Error::warehouse)?;
    report.dimensions = load.stats;
    report.directory = load.directory.counts();

    let missing = wh
      .missing_date_keys(date_keys)
      .await
      .map_err(Error::warehouse)?;
    if let Some(first) = missing.first() {
      warn!(count = missing.len(), %first, "fact date keys missing from date dimension");
    }
    report.missing_date_keys = missing;

    // ── Phase 2: facts ────────────────────────────────────────────────────
    info!(facts = facts.len(), "loading facts");
    report.facts = wh
      .load_facts(facts, Arc::new(load.directory), batch_size)
      .await
      .map_err(Error::warehouse)?;

    // ── Validation ────────────────────────────────────────────────────────
    let integrity = wh
      .check_referential_integrity()
      .await
      .map_err(Error::warehouse)?;
    let orphans = integrity.failures().map(|c| c.orphans).sum::<u64>();
    report.integrity = Some(integrity);

    if orphans > 0 {
      if self.config.strict_integrity {
        return Err(Error::Integrity(orphans));
      }
      warn!(orphans, "referential integrity check failed; continuing");
    }

    report.success = true;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use starload_core::{
    batch::BatchSize,
    date_key::DateKey,
    dimension::{Agent, Customer, DimensionBatch, Policy},
    directory::KeyDirectory,
    entity::{EntityType, FactKind},
    fact::{ClaimFact, FactRecord},
    integrity::{IntegrityCheck, IntegrityReport},
    stats::{DimensionLoad, FactLoadReport},
  };
  use starload_store_sqlite::SqliteWarehouse;

  use super::*;
  use crate::settings::CalendarConfig;

  // ─── Fixtures ─────────────────────────────────────────────────────────────

  fn config() -> PipelineConfig {
    PipelineConfig {
      calendar: CalendarConfig {
        populate: true,
        start:    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end:      NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
      },
      ..Default::default()
    }
  }

  fn claim(id: &str, customer: &str) -> ClaimFact {
    ClaimFact {
      claim_id: id.into(),
      customer_id: customer.into(),
      policy_id: "P001".into(),
      agent_id: "A001".into(),
      filed_date_key: Some(20240115),
      claim_amount: 500.0,
      coverage_amount: 10_000.0,
      claim_status: "Open".into(),
      ..Default::default()
    }
  }

  fn bundle() -> TransformedData {
    TransformedData {
      customers: vec![Customer { customer_id: "C001".into(), ..Default::default() }],
      policies: vec![Policy {
        policy_id: "P001".into(),
        policy_type: "Home".into(),
        ..Default::default()
      }],
      agents: vec![Agent { agent_id: "A001".into(), ..Default::default() }],
      claims: vec![claim("CL1", "C001"), claim("CL2", "C999")],
      ..Default::default()
    }
  }

  async fn warehouse() -> SqliteWarehouse {
    SqliteWarehouse::open_in_memory().await.expect("in-memory warehouse")
  }

  /// Delegates to SQLite but injects a failure at one point of the run.
  struct Faulty {
    inner: SqliteWarehouse,
    fault: Fault,
  }

  #[derive(Clone, Copy, PartialEq)]
  enum Fault {
    FactPhase,
    Orphans,
  }

  #[derive(Debug, thiserror::Error)]
  enum FaultError {
    #[error(transparent)]
    Store(#[from] starload_store_sqlite::Error),
    #[error("connection lost")]
    ConnectionLost,
  }

  impl Warehouse for Faulty {
    type Error = FaultError;

    async fn load_dimensions(
      &self,
      batches: Vec<DimensionBatch>,
      batch_size: BatchSize,
    ) -> Result<DimensionLoad, FaultError> {
      Ok(self.inner.load_dimensions(batches, batch_size).await?)
    }

    async fn populate_calendar(
      &self,
      start: NaiveDate,
      end: NaiveDate,
    ) -> Result<usize, FaultError> {
      Ok(self.inner.populate_calendar(start, end).await?)
    }

    async fn missing_date_keys(&self, keys: Vec<DateKey>) -> Result<Vec<DateKey>, FaultError> {
      Ok(self.inner.missing_date_keys(keys).await?)
    }

    async fn load_facts(
      &self,
      facts: Vec<FactRecord>,
      directory: Arc<KeyDirectory>,
      batch_size: BatchSize,
    ) -> Result<FactLoadReport, FaultError> {
      if self.fault == Fault::FactPhase {
        return Err(FaultError::ConnectionLost);
      }
      Ok(self.inner.load_facts(facts, directory, batch_size).await?)
    }

    async fn check_referential_integrity(&self) -> Result<IntegrityReport, FaultError> {
      let mut report = self.inner.check_referential_integrity().await?;
      if self.fault == Fault::Orphans {
        report.checks.push(IntegrityCheck {
          fact:     FactKind::Claim,
          category: "agents".into(),
          orphans:  2,
        });
      }
      Ok(report)
    }

    async fn truncate_all(&self) -> Result<(), FaultError> {
      Ok(self.inner.truncate_all().await?)
    }
  }

  // ─── Runs ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn full_run_loads_and_reports() {
    let pipeline = Pipeline::new(warehouse().await, config());
    let report = pipeline.run(bundle()).await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.calendar_days_inserted, 366);
    assert_eq!(report.dimensions[&EntityType::Customer].inserted, 1);
    assert_eq!(report.directory[&EntityType::Agent], 1);
    assert!(report.missing_date_keys.is_empty());

    let claims = report.facts.get(FactKind::Claim);
    assert_eq!(claims.total_processed, 2);
    assert_eq!(claims.successfully_loaded, 1);
    assert_eq!(claims.failed_validation, 1);
    assert_eq!(report.success_rate(FactKind::Claim), Some(50.0));
    assert!(report.integrity.as_ref().is_some_and(IntegrityReport::all_valid));
  }

  #[tokio::test]
  async fn second_run_updates_dimensions_and_skips_duplicate_facts() {
    let pipeline = Pipeline::new(warehouse().await, config());
    pipeline.run(bundle()).await;
    let report = pipeline.run(bundle()).await;

    assert!(report.success);
    assert_eq!(report.calendar_days_inserted, 0);
    assert_eq!(report.dimensions[&EntityType::Customer].updated, 1);
    assert_eq!(report.dimensions[&EntityType::Customer].inserted, 0);

    let claims = report.facts.get(FactKind::Claim);
    assert_eq!(claims.duplicate_count, 1);
    assert_eq!(claims.failed_validation, 1);
    assert_eq!(claims.successfully_loaded, 0);
    assert_eq!(pipeline.warehouse().fact_count(FactKind::Claim).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn fact_phase_failure_keeps_committed_dimensions() {
    let inner = warehouse().await;
    let pipeline = Pipeline::new(Faulty { inner, fault: Fault::FactPhase }, config());
    let report = pipeline.run(bundle()).await;

    assert!(!report.success);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("connection lost")));
    assert_eq!(report.dimensions[&EntityType::Customer].inserted, 1);

    let inner = &pipeline.warehouse().inner;
    assert!(inner.dimension_key(EntityType::Customer, "C001").await.unwrap().is_some());
    assert_eq!(inner.fact_count(FactKind::Claim).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn orphans_fail_a_strict_run_only() {
    let inner = warehouse().await;
    let strict = Pipeline::new(Faulty { inner: inner.clone(), fault: Fault::Orphans }, config());
    let report = strict.run(bundle()).await;
    assert!(!report.success);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("integrity")));
    assert_eq!(report.integrity.unwrap().failures().count(), 1);

    let lenient = Pipeline::new(
      Faulty { inner, fault: Fault::Orphans },
      PipelineConfig { strict_integrity: false, ..config() },
    );
    let report = lenient.run(bundle()).await;
    assert!(report.success);
    assert!(report.error.is_none());
  }

  #[tokio::test]
  async fn missing_calendar_is_reported_and_facts_are_rejected() {
    let cfg = PipelineConfig {
      calendar: CalendarConfig { populate: false, ..config().calendar },
      ..config()
    };
    let pipeline = Pipeline::new(warehouse().await, cfg);
    let report = pipeline.run(bundle()).await;

    assert!(report.success);
    assert_eq!(report.missing_date_keys, vec![
      DateKey::from_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    ]);
    let claims = report.facts.get(FactKind::Claim);
    assert_eq!(claims.successfully_loaded, 0);
    assert_eq!(claims.failed_validation, 2);
  }

  #[tokio::test]
  async fn reload_truncates_before_loading() {
    let store = warehouse().await;
    Pipeline::new(store.clone(), config()).run(bundle()).await;
    assert_eq!(store.fact_count(FactKind::Claim).await.unwrap(), 1);

    let reload = Pipeline::new(store.clone(), PipelineConfig { reload: true, ..config() });
    let dimensions_only = TransformedData { claims: Vec::new(), ..bundle() };
    let report = reload.run(dimensions_only).await;

    assert!(report.success);
    assert_eq!(report.dimensions[&EntityType::Customer].inserted, 1);
    assert_eq!(store.fact_count(FactKind::Claim).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn invalid_batch_size_fails_the_run_before_loading() {
    let store = warehouse().await;
    let pipeline = Pipeline::new(store.clone(), PipelineConfig { batch_size: 0, ..config() });
    let report = pipeline.run(bundle()).await;

    assert!(!report.success);
    assert!(store.dimension_key(EntityType::Customer, "C001").await.unwrap().is_none());
  }
}
