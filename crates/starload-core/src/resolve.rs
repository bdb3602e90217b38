//! Fact resolution: duplicate filtering and business-key to surrogate-key
//! translation.
//!
//! A fact is only loadable when its own business key is new (neither
//! persisted by an earlier run nor accepted earlier in this run) and every
//! required dimension reference is present in the frozen [`KeyDirectory`].
//! Rejections are ordinary values; nothing here fails the run.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
  date_key::DateKey,
  directory::KeyDirectory,
  entity::{EntityType, FactKind, SurrogateKey},
  fact::{ClaimFact, FactRecord, ResolvedClaim, ResolvedFact, ResolvedSale, SaleFact},
};

// ─── Rejection ───────────────────────────────────────────────────────────────

/// Why a fact record was not loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
  #[error("duplicate {kind} {business_key:?}")]
  Duplicate { kind: FactKind, business_key: String },

  #[error("{kind} has an empty business key")]
  MissingBusinessKey { kind: FactKind },

  #[error("missing {entity} reference {business_key:?}")]
  UnresolvedReference { entity: EntityType, business_key: String },

  #[error("missing {field}")]
  MissingDateKey { field: &'static str },

  #[error("invalid {field}: {value}")]
  InvalidDateKey { field: &'static str, value: i64 },

  #[error("business rule violated: {0}")]
  BusinessRule(String),
}

impl Rejection {
  /// Duplicates are counted apart from validation failures.
  pub fn is_duplicate(&self) -> bool { matches!(self, Self::Duplicate { .. }) }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Per-run fact resolver.
///
/// Seeded once with the business keys already persisted for each fact kind,
/// then told about every fact accepted during the run via
/// [`FactResolver::accept`].
#[derive(Debug, Default)]
pub struct FactResolver {
  known: HashMap<FactKind, HashSet<String>>,
}

impl FactResolver {
  pub fn extend_existing(
    &mut self,
    kind: FactKind,
    business_keys: impl IntoIterator<Item = String>,
  ) {
    self.known.entry(kind).or_default().extend(business_keys);
  }

  /// Number of business keys currently treated as loaded for `kind`.
  pub fn known(&self, kind: FactKind) -> usize {
    self.known.get(&kind).map_or(0, HashSet::len)
  }

  pub fn is_duplicate(&self, kind: FactKind, business_key: &str) -> bool {
    self
      .known
      .get(&kind)
      .is_some_and(|keys| keys.contains(business_key))
  }

  /// Mark a fact as persisted so later records with the same business key in
  /// this run are rejected as duplicates.
  pub fn accept(&mut self, kind: FactKind, business_key: impl Into<String>) {
    self.known.entry(kind).or_default().insert(business_key.into());
  }

  pub fn resolve(
    &self,
    record: &FactRecord,
    directory: &KeyDirectory,
  ) -> Result<ResolvedFact, Rejection> {
    let kind = record.kind();
    let business_key = record.business_key();

    if business_key.trim().is_empty() {
      return Err(Rejection::MissingBusinessKey { kind });
    }
    if self.is_duplicate(kind, business_key) {
      return Err(Rejection::Duplicate {
        kind,
        business_key: business_key.to_owned(),
      });
    }

    match record {
      FactRecord::Claim(claim) => resolve_claim(claim, directory).map(ResolvedFact::Claim),
      FactRecord::Sale(sale) => resolve_sale(sale, directory).map(ResolvedFact::Sale),
    }
  }
}

// ─── Per-kind resolution ─────────────────────────────────────────────────────

fn resolve_claim(claim: &ClaimFact, directory: &KeyDirectory) -> Result<ResolvedClaim, Rejection> {
  let customer_key = require(directory, EntityType::Customer, &claim.customer_id)?;
  let policy_key = require(directory, EntityType::Policy, &claim.policy_id)?;
  let agent_key = require(directory, EntityType::Agent, &claim.agent_id)?;
  let filed_date_key = required_date("filed_date_key", claim.filed_date_key)?;
  let closed_date_key = optional_date("closed_date_key", claim.closed_date_key)?;

  if !(claim.claim_amount > 0.0 && claim.claim_amount <= claim.coverage_amount) {
    return Err(Rejection::BusinessRule(format!(
      "claim amount {} must be positive and within coverage {}",
      claim.claim_amount, claim.coverage_amount
    )));
  }

  Ok(ResolvedClaim {
    claim_id: claim.claim_id.clone(),
    customer_key,
    policy_key,
    agent_key,
    filed_date_key,
    closed_date_key,
    claim_amount: claim.claim_amount,
    coverage_amount: claim.coverage_amount,
    deductible_amount: claim.deductible_amount,
    payout_amount: claim.payout_amount,
    processing_days: claim.processing_days,
    claim_status: claim.claim_status.clone(),
  })
}

fn resolve_sale(sale: &SaleFact, directory: &KeyDirectory) -> Result<ResolvedSale, Rejection> {
  let customer_key = require(directory, EntityType::Customer, &sale.customer_id)?;
  let book_key = require(directory, EntityType::Book, &sale.isbn)?;
  let author_key = require(directory, EntityType::Author, &sale.author_id)?;
  let date_key = required_date("order_date_key", sale.order_date_key)?;

  if sale.quantity <= 0 {
    return Err(Rejection::BusinessRule(format!(
      "quantity {} must be positive",
      sale.quantity
    )));
  }
  if sale.price.is_nan() || sale.price < 0.0 {
    return Err(Rejection::BusinessRule(format!(
      "price {} must not be negative",
      sale.price
    )));
  }

  Ok(ResolvedSale {
    order_id: sale.order_id.clone(),
    customer_key,
    book_key,
    author_key,
    date_key,
    quantity: sale.quantity,
    price: sale.price,
  })
}

fn require(
  directory: &KeyDirectory,
  entity: EntityType,
  business_key: &str,
) -> Result<SurrogateKey, Rejection> {
  directory
    .get(entity, business_key)
    .ok_or_else(|| Rejection::UnresolvedReference {
      entity,
      business_key: business_key.to_owned(),
    })
}

fn required_date(field: &'static str, raw: Option<i64>) -> Result<DateKey, Rejection> {
  optional_date(field, raw)?.ok_or(Rejection::MissingDateKey { field })
}

fn optional_date(field: &'static str, raw: Option<i64>) -> Result<Option<DateKey>, Rejection> {
  match raw {
    None => Ok(None),
    Some(value) => {
      DateKey::from_raw(value).map_err(|_| Rejection::InvalidDateKey { field, value })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::directory::KeyDirectoryBuilder;

  fn directory() -> KeyDirectory {
    let mut builder = KeyDirectoryBuilder::default();
    builder.put(EntityType::Customer, "CUST001", SurrogateKey(1));
    builder.put(EntityType::Policy, "POL0001", SurrogateKey(2));
    builder.put(EntityType::Agent, "AGT001", SurrogateKey(3));
    builder.put(EntityType::Book, "978000000000-1", SurrogateKey(4));
    builder.put(EntityType::Author, "AUTH01", SurrogateKey(5));
    builder.freeze()
  }

  fn claim(id: &str) -> ClaimFact {
    ClaimFact {
      claim_id: id.into(),
      customer_id: "CUST001".into(),
      policy_id: "POL0001".into(),
      agent_id: "AGT001".into(),
      filed_date_key: Some(20240315),
      closed_date_key: Some(20240420),
      claim_amount: 5000.0,
      coverage_amount: 50000.0,
      deductible_amount: Some(500.0),
      payout_amount: Some(4500.0),
      processing_days: Some(36),
      claim_status: "Approved".into(),
    }
  }

  fn sale(id: &str) -> SaleFact {
    SaleFact {
      order_id: id.into(),
      customer_id: "CUST001".into(),
      isbn: "978000000000-1".into(),
      author_id: "AUTH01".into(),
      order_date_key: Some(20240101),
      quantity: 2,
      price: 12.5,
    }
  }

  #[test]
  fn resolves_every_reference() {
    let resolver = FactResolver::default();
    let resolved = resolver
      .resolve(&claim("CLM00001").into(), &directory())
      .unwrap();
    let ResolvedFact::Claim(c) = resolved else { panic!("expected claim") };
    assert_eq!(c.customer_key, SurrogateKey(1));
    assert_eq!(c.policy_key, SurrogateKey(2));
    assert_eq!(c.agent_key, SurrogateKey(3));
    assert_eq!(c.filed_date_key.get(), 20240315);
    assert_eq!(c.closed_date_key.map(DateKey::get), Some(20240420));
    assert_eq!(c.payout_amount, Some(4500.0));
    assert_eq!(c.claim_status, "Approved");
  }

  #[test]
  fn unknown_customer_is_rejected_not_raised() {
    let mut record = claim("CLM00002");
    record.customer_id = "C999".into();
    let err = FactResolver::default()
      .resolve(&record.into(), &directory())
      .unwrap_err();
    assert_eq!(
      err,
      Rejection::UnresolvedReference {
        entity: EntityType::Customer,
        business_key: "C999".into(),
      }
    );
    assert!(!err.is_duplicate());
  }

  #[test]
  fn open_claim_has_no_closed_date() {
    let mut record = claim("CLM00003");
    record.closed_date_key = Some(0);
    let ResolvedFact::Claim(c) = FactResolver::default()
      .resolve(&record.into(), &directory())
      .unwrap()
    else {
      panic!("expected claim")
    };
    assert_eq!(c.closed_date_key, None);
  }

  #[test]
  fn filed_date_is_required() {
    let mut record = claim("CLM00004");
    record.filed_date_key = Some(0);
    let err = FactResolver::default()
      .resolve(&record.into(), &directory())
      .unwrap_err();
    assert_eq!(err, Rejection::MissingDateKey { field: "filed_date_key" });
  }

  #[test]
  fn malformed_date_is_rejected() {
    let mut record = claim("CLM00005");
    record.closed_date_key = Some(20200230);
    let err = FactResolver::default()
      .resolve(&record.into(), &directory())
      .unwrap_err();
    assert!(matches!(err, Rejection::InvalidDateKey { field: "closed_date_key", .. }));
  }

  #[test]
  fn claim_exceeding_coverage_breaks_business_rule() {
    let mut record = claim("CLM00006");
    record.claim_amount = 60000.0;
    let err = FactResolver::default()
      .resolve(&record.into(), &directory())
      .unwrap_err();
    assert!(matches!(err, Rejection::BusinessRule(_)));

    let mut exact = claim("CLM00007");
    exact.claim_amount = exact.coverage_amount;
    assert!(FactResolver::default().resolve(&exact.into(), &directory()).is_ok());
  }

  #[test]
  fn duplicates_short_circuit_resolution() {
    let mut resolver = FactResolver::default();
    resolver.extend_existing(FactKind::Claim, ["CLM00001".to_owned()]);

    // Even an otherwise unresolvable record is reported as a duplicate.
    let mut record = claim("CLM00001");
    record.agent_id = "nobody".into();
    let err = resolver.resolve(&record.into(), &directory()).unwrap_err();
    assert!(err.is_duplicate());
  }

  #[test]
  fn accepted_keys_become_duplicates_within_the_run() {
    let mut resolver = FactResolver::default();
    let record: FactRecord = sale("ORD1").into();
    assert!(resolver.resolve(&record, &directory()).is_ok());
    resolver.accept(record.kind(), record.business_key());

    assert!(resolver.resolve(&record, &directory()).unwrap_err().is_duplicate());
    assert_eq!(resolver.known(FactKind::Sale), 1);
    // Same key under another fact kind is unrelated.
    assert!(!resolver.is_duplicate(FactKind::Claim, "ORD1"));
  }

  #[test]
  fn sale_rules_and_references() {
    let resolver = FactResolver::default();

    let mut zero_qty = sale("ORD2");
    zero_qty.quantity = 0;
    assert!(matches!(
      resolver.resolve(&zero_qty.into(), &directory()),
      Err(Rejection::BusinessRule(_))
    ));

    let mut unknown_book = sale("ORD3");
    unknown_book.isbn = "INVALID".into();
    assert!(matches!(
      resolver.resolve(&unknown_book.into(), &directory()),
      Err(Rejection::UnresolvedReference { entity: EntityType::Book, .. })
    ));
  }

  #[test]
  fn empty_business_key_is_rejected() {
    let err = FactResolver::default()
      .resolve(&claim("  ").into(), &directory())
      .unwrap_err();
    assert_eq!(err, Rejection::MissingBusinessKey { kind: FactKind::Claim });
  }
}
