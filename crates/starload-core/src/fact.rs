//! Fact records, as delivered by the normalizer (business-keyed) and after
//! resolution (surrogate-keyed).
//!
//! Facts are immutable once loaded: there is no update path, only insert or
//! reject.

use serde::{Deserialize, Serialize};

use crate::{
  date_key::DateKey,
  entity::{FactKind, SurrogateKey},
};

// ─── Incoming ────────────────────────────────────────────────────────────────

/// An insurance claim referencing customer, policy and agent by business key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimFact {
  pub claim_id:          String,
  pub customer_id:       String,
  pub policy_id:         String,
  pub agent_id:          String,
  /// `YYYYMMDD`; required.
  pub filed_date_key:    Option<i64>,
  /// `YYYYMMDD`; absent, zero or negative while the claim is still open.
  pub closed_date_key:   Option<i64>,
  pub claim_amount:      f64,
  pub coverage_amount:   f64,
  pub deductible_amount: Option<f64>,
  pub payout_amount:     Option<f64>,
  pub processing_days:   Option<i64>,
  pub claim_status:      String,
}

/// A book sale referencing customer, book and author by business key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleFact {
  pub order_id:       String,
  pub customer_id:    String,
  pub isbn:           String,
  pub author_id:      String,
  /// `YYYYMMDD`; required.
  pub order_date_key: Option<i64>,
  pub quantity:       i64,
  pub price:          f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FactRecord {
  Claim(ClaimFact),
  Sale(SaleFact),
}

impl FactRecord {
  pub fn kind(&self) -> FactKind {
    match self {
      Self::Claim(_) => FactKind::Claim,
      Self::Sale(_) => FactKind::Sale,
    }
  }

  pub fn business_key(&self) -> &str {
    match self {
      Self::Claim(c) => &c.claim_id,
      Self::Sale(s) => &s.order_id,
    }
  }
}

impl From<ClaimFact> for FactRecord {
  fn from(value: ClaimFact) -> Self { Self::Claim(value) }
}

impl From<SaleFact> for FactRecord {
  fn from(value: SaleFact) -> Self { Self::Sale(value) }
}

// ─── Resolved ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedClaim {
  pub claim_id:          String,
  pub customer_key:      SurrogateKey,
  pub policy_key:        SurrogateKey,
  pub agent_key:         SurrogateKey,
  pub filed_date_key:    DateKey,
  pub closed_date_key:   Option<DateKey>,
  pub claim_amount:      f64,
  pub coverage_amount:   f64,
  pub deductible_amount: Option<f64>,
  pub payout_amount:     Option<f64>,
  pub processing_days:   Option<i64>,
  pub claim_status:      String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSale {
  pub order_id:     String,
  pub customer_key: SurrogateKey,
  pub book_key:     SurrogateKey,
  pub author_key:   SurrogateKey,
  pub date_key:     DateKey,
  pub quantity:     i64,
  pub price:        f64,
}

/// A fact whose every dimension reference has been translated to a surrogate
/// key and which is ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedFact {
  Claim(ResolvedClaim),
  Sale(ResolvedSale),
}

impl ResolvedFact {
  pub fn kind(&self) -> FactKind {
    match self {
      Self::Claim(_) => FactKind::Claim,
      Self::Sale(_) => FactKind::Sale,
    }
  }

  pub fn business_key(&self) -> &str {
    match self {
      Self::Claim(c) => &c.claim_id,
      Self::Sale(s) => &s.order_id,
    }
  }
}
