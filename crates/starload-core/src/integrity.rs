//! Post-load referential integrity report.
//!
//! Diagnostic only: orphaned references are counted and reported, never
//! deleted or repaired.

use serde::{Deserialize, Serialize};

use crate::entity::FactKind;

/// Orphan count for one foreign-key column of one fact table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityCheck {
  pub fact:     FactKind,
  /// Reference category, e.g. `"agents"` or `"filed_dates"`.
  pub category: String,
  pub orphans:  u64,
}

impl IntegrityCheck {
  pub fn is_clean(&self) -> bool { self.orphans == 0 }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
  pub checks: Vec<IntegrityCheck>,
}

impl IntegrityReport {
  pub fn all_valid(&self) -> bool { self.checks.iter().all(IntegrityCheck::is_clean) }

  /// Orphans for `(fact, category)`, or `None` if that category was not
  /// checked.
  pub fn orphans(&self, fact: FactKind, category: &str) -> Option<u64> {
    self
      .checks
      .iter()
      .find(|c| c.fact == fact && c.category == category)
      .map(|c| c.orphans)
  }

  pub fn failures(&self) -> impl Iterator<Item = &IntegrityCheck> {
    self.checks.iter().filter(|c| !c.is_clean())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn any_orphan_fails_the_report() {
    let report = IntegrityReport {
      checks: vec![
        IntegrityCheck { fact: FactKind::Claim, category: "customers".into(), orphans: 0 },
        IntegrityCheck { fact: FactKind::Claim, category: "agents".into(), orphans: 1 },
      ],
    };
    assert!(!report.all_valid());
    assert_eq!(report.orphans(FactKind::Claim, "agents"), Some(1));
    assert_eq!(report.orphans(FactKind::Sale, "agents"), None);
    assert_eq!(report.failures().count(), 1);
    assert!(IntegrityReport::default().all_valid());
  }
}
