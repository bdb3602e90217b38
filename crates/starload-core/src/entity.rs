//! Entity and fact kinds, and the opaque surrogate key.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// A dimension type in the star schema.
///
/// Each variant owns one dimension table with an identity-generated integer
/// key and a unique business-key column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityType {
  Customer,
  Policy,
  Agent,
  Book,
  Author,
}

impl EntityType {
  /// Name of the field carrying the business key in incoming records.
  pub fn business_key_field(self) -> &'static str {
    match self {
      Self::Customer => "customer_id",
      Self::Policy => "policy_id",
      Self::Agent => "agent_id",
      Self::Book => "isbn",
      Self::Author => "author_id",
    }
  }
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// A fact table in the star schema.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactKind {
  /// Insurance claims, keyed by `claim_id`.
  Claim,
  /// Book sales, keyed by `order_id`.
  Sale,
}

// ─── Surrogate key ───────────────────────────────────────────────────────────

/// An internally generated dimension key.
///
/// Assigned exactly once per distinct business key by the store's identity
/// generation and never reassigned. Callers must not rely on any numeric
/// pattern.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SurrogateKey(pub i64);

impl SurrogateKey {
  pub fn get(self) -> i64 { self.0 }
}

impl fmt::Display for SurrogateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}
