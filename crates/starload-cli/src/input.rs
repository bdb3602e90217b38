//! The transformed-data bundle handed over by the normalizer.
//!
//! One JSON object with an array per entity and fact type. Missing arrays
//! are treated as empty.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use starload_core::{
  date_key::DateKey,
  dimension::{Agent, Author, Book, Customer, DimensionBatch, Policy},
  entity::EntityType,
  fact::{ClaimFact, FactRecord, SaleFact},
};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformedData {
  pub customers: Vec<Customer>,
  pub policies:  Vec<Policy>,
  pub agents:    Vec<Agent>,
  pub books:     Vec<Book>,
  pub authors:   Vec<Author>,
  pub claims:    Vec<ClaimFact>,
  pub sales:     Vec<SaleFact>,
}

impl TransformedData {
  pub fn from_path(path: &Path) -> Result<Self> {
    let raw = fs::read_to_string(path).map_err(|source| Error::ReadInput {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::ParseInput {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Every well-formed date key referenced by a fact. Absent, non-positive
  /// and malformed keys are left to the fact resolver.
  pub fn date_keys(&self) -> Vec<DateKey> {
    let claims = self
      .claims
      .iter()
      .flat_map(|c| [c.filed_date_key, c.closed_date_key]);
    let sales = self.sales.iter().map(|s| s.order_date_key);

    let mut keys = claims
      .chain(sales)
      .flatten()
      .filter_map(|raw| DateKey::from_raw(raw).ok().flatten())
      .collect::<Vec<_>>();
    keys.sort_unstable();
    keys.dedup();
    keys
  }

  /// Split into dimension batches (in load order, empty ones dropped) and
  /// fact records.
  pub fn into_parts(self) -> (Vec<DimensionBatch>, Vec<FactRecord>) {
    let batches = [
      DimensionBatch::new(EntityType::Customer, self.customers),
      DimensionBatch::new(EntityType::Policy, self.policies),
      DimensionBatch::new(EntityType::Agent, self.agents),
      DimensionBatch::new(EntityType::Book, self.books),
      DimensionBatch::new(EntityType::Author, self.authors),
    ]
    .into_iter()
    .filter(|batch| !batch.is_empty())
    .collect();

    let facts = self
      .claims
      .into_iter()
      .map(FactRecord::from)
      .chain(self.sales.into_iter().map(FactRecord::from))
      .collect();

    (batches, facts)
  }
}
