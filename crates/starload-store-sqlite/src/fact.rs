//! Fact loader: resolve, filter and insert fact records.
//!
//! Facts are insert-only. A fact whose business key was already persisted or
//! already accepted earlier in the run is a duplicate; it is counted and
//! skipped, never overwritten.

use rusqlite::{Connection, params};
use starload_core::{
  directory::KeyDirectory,
  entity::FactKind,
  fact::{FactRecord, ResolvedClaim, ResolvedFact, ResolvedSale},
  resolve::FactResolver,
  stats::FactLoadReport,
};
use tracing::{debug, warn};

use crate::{error::RecordError, schema::fact_table};

/// Every business key already persisted for `kind`.
pub fn existing_business_keys(conn: &Connection, kind: FactKind) -> rusqlite::Result<Vec<String>> {
  let (table, business_key) = fact_table(kind);
  let mut stmt = conn.prepare(&format!("SELECT {business_key} FROM {table}"))?;
  let keys = stmt
    .query_map([], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  debug!(%kind, existing = keys.len(), "seeded duplicate filter");
  Ok(keys)
}

/// Resolve and insert one chunk of facts.
///
/// Returns `Err` only for fatal errors. Every record in the chunk lands in
/// exactly one of the loaded / failed / duplicate counters.
pub fn load_batch(
  conn: &Connection,
  records: &[FactRecord],
  directory: &KeyDirectory,
  resolver: &mut FactResolver,
  now: &str,
) -> rusqlite::Result<FactLoadReport> {
  let mut report = FactLoadReport::default();

  for record in records {
    let kind = record.kind();
    report.entry(kind).total_processed += 1;

    let resolved = match resolver.resolve(record, directory) {
      Ok(resolved) => resolved,
      Err(rejection) if rejection.is_duplicate() => {
        report.entry(kind).duplicate_count += 1;
        warn!(%kind, business_key = record.business_key(), "skipping duplicate fact");
        continue;
      }
      Err(rejection) => {
        report.entry(kind).failed_validation += 1;
        warn!(
          %kind,
          business_key = record.business_key(),
          reason = %rejection,
          "skipping invalid fact"
        );
        continue;
      }
    };

    match insert_fact(conn, &resolved, now) {
      Ok(()) => {
        report.entry(kind).successfully_loaded += 1;
        resolver.accept(kind, resolved.business_key());
      }
      Err(RecordError::Skipped(reason)) => {
        report.entry(kind).failed_validation += 1;
        warn!(%kind, business_key = record.business_key(), %reason, "fact insert rejected");
      }
      Err(RecordError::Fatal(err)) => return Err(err),
    }
  }

  Ok(report)
}

fn insert_fact(conn: &Connection, fact: &ResolvedFact, now: &str) -> Result<(), RecordError> {
  match fact {
    ResolvedFact::Claim(claim) => insert_claim(conn, claim, now)?,
    ResolvedFact::Sale(sale) => insert_sale(conn, sale, now)?,
  }
  Ok(())
}

fn insert_claim(conn: &Connection, claim: &ResolvedClaim, now: &str) -> rusqlite::Result<()> {
  conn
    .prepare_cached(
      "INSERT INTO fact_claims
         (claim_id, customer_key, policy_key, agent_key, filed_date_key,
          closed_date_key, claim_amount, coverage_amount, deductible_amount,
          payout_amount, processing_days, claim_status, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?
    .execute(params![
      claim.claim_id,
      claim.customer_key.get(),
      claim.policy_key.get(),
      claim.agent_key.get(),
      claim.filed_date_key.get(),
      claim.closed_date_key.map(|k| k.get()),
      claim.claim_amount,
      claim.coverage_amount,
      claim.deductible_amount,
      claim.payout_amount,
      claim.processing_days,
      claim.claim_status,
      now,
    ])?;
  Ok(())
}

fn insert_sale(conn: &Connection, sale: &ResolvedSale, now: &str) -> rusqlite::Result<()> {
  conn
    .prepare_cached(
      "INSERT INTO fact_sales
         (order_id, customer_key, book_key, author_key, date_key, quantity,
          price, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?
    .execute(params![
      sale.order_id,
      sale.customer_key.get(),
      sale.book_key.get(),
      sale.author_key.get(),
      sale.date_key.get(),
      sale.quantity,
      sale.price,
      now,
    ])?;
  Ok(())
}
