//! Per-record outcomes and the statistics aggregated from them.
//!
//! Chunk-level statistics are folded into run-level totals by summation,
//! never by replacement.

use std::{collections::BTreeMap, iter::Sum, ops::AddAssign};

use serde::{Deserialize, Serialize};

use crate::{
  directory::KeyDirectory,
  entity::{EntityType, FactKind, SurrogateKey},
};

// ─── Dimension side ──────────────────────────────────────────────────────────

/// Successful result of upserting one dimension record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  /// A new row was inserted and assigned this key.
  Inserted(SurrogateKey),
  /// An existing row had its attributes overwritten; its key is unchanged.
  Updated(SurrogateKey),
}

impl UpsertOutcome {
  pub fn key(self) -> SurrogateKey {
    match self {
      Self::Inserted(key) | Self::Updated(key) => key,
    }
  }
}

/// A record skipped by a loader, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
  pub business_key: String,
  pub reason:       String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionStats {
  pub processed: u64,
  pub inserted:  u64,
  pub updated:   u64,
  pub failed:    u64,
}

impl DimensionStats {
  /// Records that ended up in the key directory.
  pub fn loaded(&self) -> u64 { self.inserted + self.updated }

  pub fn record(&mut self, outcome: &Result<UpsertOutcome, RecordFailure>) {
    self.processed += 1;
    match outcome {
      Ok(UpsertOutcome::Inserted(_)) => self.inserted += 1,
      Ok(UpsertOutcome::Updated(_)) => self.updated += 1,
      Err(_) => self.failed += 1,
    }
  }
}

impl AddAssign for DimensionStats {
  fn add_assign(&mut self, rhs: Self) {
    self.processed += rhs.processed;
    self.inserted += rhs.inserted;
    self.updated += rhs.updated;
    self.failed += rhs.failed;
  }
}

/// Result of one dimension phase: the frozen directory plus per-entity
/// statistics.
#[derive(Debug, Clone, Default)]
pub struct DimensionLoad {
  pub directory: KeyDirectory,
  pub stats:     BTreeMap<EntityType, DimensionStats>,
}

// ─── Fact side ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactLoadStats {
  pub total_processed:     u64,
  pub successfully_loaded: u64,
  pub failed_validation:   u64,
  pub duplicate_count:     u64,
}

impl FactLoadStats {
  /// Loaded share of processed records, in percent. `None` when nothing was
  /// processed.
  pub fn success_rate(&self) -> Option<f64> {
    (self.total_processed > 0)
      .then(|| self.successfully_loaded as f64 / self.total_processed as f64 * 100.0)
  }
}

impl AddAssign for FactLoadStats {
  fn add_assign(&mut self, rhs: Self) {
    self.total_processed += rhs.total_processed;
    self.successfully_loaded += rhs.successfully_loaded;
    self.failed_validation += rhs.failed_validation;
    self.duplicate_count += rhs.duplicate_count;
  }
}

impl Sum for FactLoadStats {
  fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
    iter.fold(Self::default(), |mut acc, s| {
      acc += s;
      acc
    })
  }
}

/// Fact statistics per fact kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactLoadReport {
  pub stats: BTreeMap<FactKind, FactLoadStats>,
}

impl FactLoadReport {
  pub fn entry(&mut self, kind: FactKind) -> &mut FactLoadStats {
    self.stats.entry(kind).or_default()
  }

  pub fn get(&self, kind: FactKind) -> FactLoadStats {
    self.stats.get(&kind).copied().unwrap_or_default()
  }

  pub fn total(&self) -> FactLoadStats { self.stats.values().copied().sum() }
}

impl AddAssign for FactLoadReport {
  fn add_assign(&mut self, rhs: Self) {
    for (kind, stats) in rhs.stats {
      *self.entry(kind) += stats;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn chunk_stats_are_summed() {
    let mut report = FactLoadReport::default();
    for _ in 0..3 {
      let mut chunk = FactLoadReport::default();
      *chunk.entry(FactKind::Claim) = FactLoadStats {
        total_processed:     10,
        successfully_loaded: 8,
        failed_validation:   1,
        duplicate_count:     1,
      };
      report += chunk;
    }
    let claims = report.get(FactKind::Claim);
    assert_eq!(claims.total_processed, 30);
    assert_eq!(claims.successfully_loaded, 24);
    assert_eq!(claims.failed_validation, 3);
    assert_eq!(claims.duplicate_count, 3);
    assert_eq!(report.get(FactKind::Sale), FactLoadStats::default());
  }

  #[test]
  fn success_rate_guards_empty_runs() {
    assert_eq!(FactLoadStats::default().success_rate(), None);
    let stats = FactLoadStats {
      total_processed: 4,
      successfully_loaded: 3,
      ..Default::default()
    };
    assert_eq!(stats.success_rate(), Some(75.0));
  }

  #[test]
  fn dimension_stats_count_outcomes() {
    let mut stats = DimensionStats::default();
    stats.record(&Ok(UpsertOutcome::Inserted(SurrogateKey(1))));
    stats.record(&Ok(UpsertOutcome::Updated(SurrogateKey(2))));
    stats.record(&Err(RecordFailure {
      business_key: "X".into(),
      reason:       "bad".into(),
    }));
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.loaded(), 2);
    assert_eq!(stats.failed, 1);
  }
}
