//! Encoding helpers between domain records and SQLite column values.
//!
//! Calendar dates are stored as ISO 8601 `YYYY-MM-DD` strings and audit
//! timestamps as RFC 3339. Every dimension record flattens into a
//! [`DimensionRow`]: its business key plus the ordered list of mutable
//! attribute columns that an SCD Type 1 update overwrites.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use starload_core::dimension::{Agent, Author, Book, Customer, DimensionRecord, Policy};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

fn text(value: &Option<String>) -> Value {
  value.clone().map_or(Value::Null, Value::Text)
}

fn date(value: Option<NaiveDate>) -> Value {
  value.map_or(Value::Null, |d| Value::Text(encode_date(d)))
}

fn real(value: Option<f64>) -> Value { value.map_or(Value::Null, Value::Real) }

fn int(value: Option<i64>) -> Value { value.map_or(Value::Null, Value::Integer) }

// ─── Dimension rows ──────────────────────────────────────────────────────────

/// A dimension record flattened into column/value pairs.
pub struct DimensionRow {
  pub business_key: String,
  /// Mutable attribute columns, in a fixed order per entity type.
  pub attributes:   Vec<(&'static str, Value)>,
}

impl DimensionRow {
  pub fn values(&self) -> impl Iterator<Item = &Value> {
    self.attributes.iter().map(|(_, v)| v)
  }
}

pub fn encode_dimension(record: &DimensionRecord) -> DimensionRow {
  let attributes = match record {
    DimensionRecord::Customer(c) => customer_columns(c),
    DimensionRecord::Policy(p) => policy_columns(p),
    DimensionRecord::Agent(a) => agent_columns(a),
    DimensionRecord::Book(b) => book_columns(b),
    DimensionRecord::Author(a) => author_columns(a),
  };
  DimensionRow { business_key: record.business_key().to_owned(), attributes }
}

fn customer_columns(c: &Customer) -> Vec<(&'static str, Value)> {
  vec![
    ("first_name", text(&c.first_name)),
    ("last_name", text(&c.last_name)),
    ("full_name", text(&c.full_name)),
    ("email", text(&c.email)),
    ("phone", text(&c.phone)),
    ("birth_date", date(c.birth_date)),
    ("age", int(c.age)),
    ("address", text(&c.address)),
    ("city", text(&c.city)),
    ("state", text(&c.state)),
    ("risk_score", real(c.risk_score)),
    ("risk_tier", text(&c.risk_tier)),
    ("customer_since", date(c.customer_since)),
  ]
}

fn policy_columns(p: &Policy) -> Vec<(&'static str, Value)> {
  vec![
    ("policy_type", Value::Text(p.policy_type.clone())),
    ("coverage_amount", real(p.coverage_amount)),
    ("annual_premium", real(p.annual_premium)),
    ("premium_tier", text(&p.premium_tier)),
    ("deductible", real(p.deductible)),
    ("effective_date", date(p.effective_date)),
    ("expiration_date", date(p.expiration_date)),
    (
      "status",
      Value::Text(p.status.clone().unwrap_or_else(|| "Active".to_owned())),
    ),
  ]
}

fn agent_columns(a: &Agent) -> Vec<(&'static str, Value)> {
  vec![
    ("first_name", text(&a.first_name)),
    ("last_name", text(&a.last_name)),
    ("full_name", text(&a.full_name)),
    ("region", text(&a.region)),
    ("experience_years", int(a.experience_years)),
    ("hire_date", date(a.hire_date)),
  ]
}

fn book_columns(b: &Book) -> Vec<(&'static str, Value)> {
  vec![
    ("title", Value::Text(b.title.clone())),
    ("author", text(&b.author)),
    ("genre", text(&b.genre)),
    ("series", text(&b.series)),
    ("pub_date", date(b.pub_date)),
  ]
}

fn author_columns(a: &Author) -> Vec<(&'static str, Value)> {
  vec![
    ("name", Value::Text(a.name.clone())),
    ("email", text(&a.email)),
    ("phone", text(&a.phone)),
    ("genres", text(&a.genres)),
  ]
}
