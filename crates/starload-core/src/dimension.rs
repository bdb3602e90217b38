//! Dimension records — the cleaned, typed business entities handed to the
//! loader by the normalizer.
//!
//! Every record carries an immutable business key plus descriptive
//! attributes. Attributes follow SCD Type 1: a later load with the same
//! business key overwrites them in place, keeping the surrogate key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;

// ─── Insurance dimensions ────────────────────────────────────────────────────

/// A policy holder or store customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub customer_id:    String,
  pub first_name:     Option<String>,
  pub last_name:      Option<String>,
  pub full_name:      Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  pub birth_date:     Option<NaiveDate>,
  pub age:            Option<i64>,
  pub address:        Option<String>,
  pub city:           Option<String>,
  pub state:          Option<String>,
  /// Risk score on a 0–10 scale.
  pub risk_score:     Option<f64>,
  pub risk_tier:      Option<String>,
  pub customer_since: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
  pub policy_id:       String,
  pub policy_type:     String,
  pub coverage_amount: Option<f64>,
  pub annual_premium:  Option<f64>,
  pub premium_tier:    Option<String>,
  pub deductible:      Option<f64>,
  pub effective_date:  Option<NaiveDate>,
  pub expiration_date: Option<NaiveDate>,
  pub status:          Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
  pub agent_id:         String,
  pub first_name:       Option<String>,
  pub last_name:        Option<String>,
  pub full_name:        Option<String>,
  pub region:           Option<String>,
  pub experience_years: Option<i64>,
  pub hire_date:        Option<NaiveDate>,
}

// ─── Bookstore dimensions ────────────────────────────────────────────────────

/// A catalogue entry, keyed by normalised ISBN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
  pub isbn:     String,
  pub title:    String,
  pub author:   Option<String>,
  pub genre:    Option<String>,
  pub series:   Option<String>,
  pub pub_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
  pub author_id: String,
  pub name:      String,
  pub email:     Option<String>,
  pub phone:     Option<String>,
  /// Comma-separated genre list, flattened by the normalizer.
  pub genres:    Option<String>,
}

// ─── Tagged record ───────────────────────────────────────────────────────────

/// Any dimension record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum DimensionRecord {
  Customer(Customer),
  Policy(Policy),
  Agent(Agent),
  Book(Book),
  Author(Author),
}

impl DimensionRecord {
  pub fn entity_type(&self) -> EntityType {
    match self {
      Self::Customer(_) => EntityType::Customer,
      Self::Policy(_) => EntityType::Policy,
      Self::Agent(_) => EntityType::Agent,
      Self::Book(_) => EntityType::Book,
      Self::Author(_) => EntityType::Author,
    }
  }

  pub fn business_key(&self) -> &str {
    match self {
      Self::Customer(c) => &c.customer_id,
      Self::Policy(p) => &p.policy_id,
      Self::Agent(a) => &a.agent_id,
      Self::Book(b) => &b.isbn,
      Self::Author(a) => &a.author_id,
    }
  }
}

macro_rules! impl_from_record {
  ($($ty:ident),*) => {
    $(
      impl From<$ty> for DimensionRecord {
        fn from(value: $ty) -> Self { Self::$ty(value) }
      }
    )*
  };
}

impl_from_record!(Customer, Policy, Agent, Book, Author);

// ─── Batch ───────────────────────────────────────────────────────────────────

/// All records of one dimension type submitted in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionBatch {
  pub entity:  EntityType,
  pub records: Vec<DimensionRecord>,
}

impl DimensionBatch {
  pub fn new<R>(entity: EntityType, records: impl IntoIterator<Item = R>) -> Self
  where
    R: Into<DimensionRecord>,
  {
    Self {
      entity,
      records: records.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn business_key_follows_variant() {
    let record: DimensionRecord = Book {
      isbn: "978030640615-7".into(),
      title: "Dune".into(),
      ..Default::default()
    }
    .into();
    assert_eq!(record.entity_type(), EntityType::Book);
    assert_eq!(record.business_key(), "978030640615-7");
  }

  #[test]
  fn customer_deserialises_with_missing_optionals() {
    let customer: Customer =
      serde_json::from_str(r#"{"customer_id":"C1","full_name":"Ada Lovelace"}"#).unwrap();
    assert_eq!(customer.customer_id, "C1");
    assert_eq!(customer.full_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(customer.risk_score, None);
  }

  #[test]
  fn batch_from_typed_records() {
    let batch = DimensionBatch::new(
      EntityType::Agent,
      vec![Agent { agent_id: "AGT001".into(), ..Default::default() }],
    );
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].entity_type(), EntityType::Agent);
  }
}
