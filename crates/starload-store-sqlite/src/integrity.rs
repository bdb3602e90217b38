//! Referential integrity checks over the fact tables.
//!
//! Each check counts fact rows whose foreign-key column has no matching row in
//! the referenced dimension. Nothing is repaired.

use rusqlite::Connection;
use starload_core::{
  entity::FactKind,
  integrity::{IntegrityCheck, IntegrityReport},
};
use tracing::{error, info};

struct Relation {
  fact:      FactKind,
  category:  &'static str,
  table:     &'static str,
  column:    &'static str,
  dimension: &'static str,
  key:       &'static str,
  /// Nullable columns only count non-null orphans.
  nullable:  bool,
}

const fn relation(
  fact: FactKind,
  category: &'static str,
  table: &'static str,
  column: &'static str,
  dimension: &'static str,
  key: &'static str,
) -> Relation {
  Relation { fact, category, table, column, dimension, key, nullable: false }
}

const RELATIONS: &[Relation] = &[
  relation(FactKind::Claim, "customers", "fact_claims", "customer_key", "dim_customer", "customer_key"),
  relation(FactKind::Claim, "policies", "fact_claims", "policy_key", "dim_policy", "policy_key"),
  relation(FactKind::Claim, "agents", "fact_claims", "agent_key", "dim_agent", "agent_key"),
  relation(FactKind::Claim, "filed_dates", "fact_claims", "filed_date_key", "dim_date", "date_key"),
  Relation {
    nullable: true,
    ..relation(FactKind::Claim, "closed_dates", "fact_claims", "closed_date_key", "dim_date", "date_key")
  },
  relation(FactKind::Sale, "customers", "fact_sales", "customer_key", "dim_customer", "customer_key"),
  relation(FactKind::Sale, "books", "fact_sales", "book_key", "dim_book", "book_key"),
  relation(FactKind::Sale, "authors", "fact_sales", "author_key", "dim_author", "author_key"),
  relation(FactKind::Sale, "dates", "fact_sales", "date_key", "dim_date", "date_key"),
];

pub fn check(conn: &Connection) -> rusqlite::Result<IntegrityReport> {
  let mut report = IntegrityReport::default();

  for rel in RELATIONS {
    let mut sql = format!(
      "SELECT COUNT(*) FROM {table} f LEFT JOIN {dim} d ON f.{col} = d.{key} WHERE d.{key} IS NULL",
      table = rel.table,
      dim = rel.dimension,
      col = rel.column,
      key = rel.key,
    );
    if rel.nullable {
      sql.push_str(&format!(" AND f.{} IS NOT NULL", rel.column));
    }
    let orphans: i64 = conn.query_row(&sql, [], |r| r.get(0))?;

    if orphans > 0 {
      error!(fact = %rel.fact, category = rel.category, orphans, "orphaned fact references");
    }
    report.checks.push(IntegrityCheck {
      fact:     rel.fact,
      category: rel.category.to_owned(),
      orphans:  orphans.unsigned_abs(),
    });
  }

  if report.all_valid() {
    info!("referential integrity checks passed");
  }
  Ok(report)
}
