//! End-of-run summary.

use std::collections::BTreeMap;

use serde::Serialize;
use starload_core::{
  date_key::DateKey,
  entity::{EntityType, FactKind},
  integrity::IntegrityReport,
  stats::{DimensionStats, FactLoadReport},
};
use tracing::{error, info, warn};

/// Everything a run did, serialisable to JSON for `--report`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
  pub success:                bool,
  /// Message of the fatal error that stopped the run, if any.
  pub error:                  Option<String>,
  pub calendar_days_inserted: usize,
  pub dimensions:             BTreeMap<EntityType, DimensionStats>,
  /// Surrogate keys available to the fact phase, per entity.
  pub directory:              BTreeMap<EntityType, usize>,
  /// Fact date keys with no row in the date dimension.
  pub missing_date_keys:      Vec<DateKey>,
  pub facts:                  FactLoadReport,
  pub integrity:              Option<IntegrityReport>,
  pub elapsed_ms:             u64,
}

impl RunReport {
  pub fn success_rate(&self, kind: FactKind) -> Option<f64> {
    self.facts.get(kind).success_rate()
  }

  /// Fact kinds whose success rate fell below `threshold` percent.
  pub fn below_threshold(&self, threshold: f64) -> Vec<(FactKind, f64)> {
    self
      .facts
      .stats
      .iter()
      .filter_map(|(kind, stats)| stats.success_rate().map(|rate| (*kind, rate)))
      .filter(|(_, rate)| *rate < threshold)
      .collect()
  }

  pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string_pretty(self) }

  pub fn log_summary(&self, threshold: f64) {
    for (kind, stats) in &self.facts.stats {
      info!(
        %kind,
        processed = stats.total_processed,
        loaded = stats.successfully_loaded,
        failed = stats.failed_validation,
        duplicates = stats.duplicate_count,
        success_rate = stats.success_rate().unwrap_or(100.0),
        "fact summary"
      );
    }
    for (kind, rate) in self.below_threshold(threshold) {
      warn!(%kind, rate, threshold, "fact success rate below quality threshold");
    }

    match &self.error {
      None => info!(elapsed_ms = self.elapsed_ms, "run completed"),
      Some(message) => error!(elapsed_ms = self.elapsed_ms, error = %message, "run failed"),
    }
  }
}
