//! SQL schema for the starload SQLite warehouse.
//!
//! Executed once at connection startup. Dimension keys use `AUTOINCREMENT` so
//! a surrogate key is never handed out twice, even after rows are deleted by
//! a full reload.

use starload_core::entity::{EntityType, FactKind};

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Dimensions ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS dim_customer (
    customer_key    INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id     TEXT NOT NULL UNIQUE CHECK (length(customer_id) > 0),
    first_name      TEXT,
    last_name       TEXT,
    full_name       TEXT,
    email           TEXT,
    phone           TEXT,
    birth_date      TEXT,
    age             INTEGER CHECK (age IS NULL OR age >= 0),
    address         TEXT,
    city            TEXT,
    state           TEXT,
    risk_score      REAL CHECK (risk_score IS NULL OR risk_score BETWEEN 0 AND 10),
    risk_tier       TEXT,
    customer_since  TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_policy (
    policy_key      INTEGER PRIMARY KEY AUTOINCREMENT,
    policy_id       TEXT NOT NULL UNIQUE CHECK (length(policy_id) > 0),
    policy_type     TEXT NOT NULL,
    coverage_amount REAL CHECK (coverage_amount IS NULL OR coverage_amount >= 0),
    annual_premium  REAL CHECK (annual_premium IS NULL OR annual_premium >= 0),
    premium_tier    TEXT,
    deductible      REAL CHECK (deductible IS NULL OR deductible >= 0),
    effective_date  TEXT,
    expiration_date TEXT,
    status          TEXT NOT NULL DEFAULT 'Active',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_agent (
    agent_key        INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id         TEXT NOT NULL UNIQUE CHECK (length(agent_id) > 0),
    first_name       TEXT,
    last_name        TEXT,
    full_name        TEXT,
    region           TEXT,
    experience_years INTEGER CHECK (experience_years IS NULL OR experience_years >= 0),
    hire_date        TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_book (
    book_key   INTEGER PRIMARY KEY AUTOINCREMENT,
    isbn       TEXT NOT NULL UNIQUE CHECK (length(isbn) > 0),
    title      TEXT NOT NULL,
    author     TEXT,
    genre      TEXT,
    series     TEXT,
    pub_date   TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_author (
    author_key INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id  TEXT NOT NULL UNIQUE CHECK (length(author_id) > 0),
    name       TEXT NOT NULL,
    email      TEXT,
    phone      TEXT,
    genres     TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Keyed directly by YYYYMMDD; never identity-generated.
CREATE TABLE IF NOT EXISTS dim_date (
    date_key     INTEGER PRIMARY KEY,
    full_date    TEXT NOT NULL,
    year         INTEGER NOT NULL,
    quarter      INTEGER NOT NULL,
    month        INTEGER NOT NULL,
    month_name   TEXT NOT NULL,
    day_of_month INTEGER NOT NULL,
    day_of_week  INTEGER NOT NULL,
    day_name     TEXT NOT NULL,
    week_of_year INTEGER NOT NULL,
    is_weekend   INTEGER NOT NULL
);

-- ── Facts ───────────────────────────────────────────────────────────────────
-- Facts are insert-only. No UPDATE is ever issued against these tables.

CREATE TABLE IF NOT EXISTS fact_claims (
    claim_key         INTEGER PRIMARY KEY AUTOINCREMENT,
    claim_id          TEXT NOT NULL UNIQUE,
    customer_key      INTEGER NOT NULL REFERENCES dim_customer(customer_key),
    policy_key        INTEGER NOT NULL REFERENCES dim_policy(policy_key),
    agent_key         INTEGER NOT NULL REFERENCES dim_agent(agent_key),
    filed_date_key    INTEGER NOT NULL REFERENCES dim_date(date_key),
    closed_date_key   INTEGER REFERENCES dim_date(date_key),
    claim_amount      REAL NOT NULL,
    coverage_amount   REAL NOT NULL,
    deductible_amount REAL,
    payout_amount     REAL,
    processing_days   INTEGER,
    claim_status      TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fact_sales (
    sale_key     INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id     TEXT NOT NULL UNIQUE,
    customer_key INTEGER NOT NULL REFERENCES dim_customer(customer_key),
    book_key     INTEGER NOT NULL REFERENCES dim_book(book_key),
    author_key   INTEGER NOT NULL REFERENCES dim_author(author_key),
    date_key     INTEGER NOT NULL REFERENCES dim_date(date_key),
    quantity     INTEGER NOT NULL CHECK (quantity > 0),
    price        REAL NOT NULL CHECK (price >= 0),
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS fact_claims_customer_idx ON fact_claims(customer_key);
CREATE INDEX IF NOT EXISTS fact_claims_policy_idx   ON fact_claims(policy_key);
CREATE INDEX IF NOT EXISTS fact_claims_agent_idx    ON fact_claims(agent_key);
CREATE INDEX IF NOT EXISTS fact_claims_filed_idx    ON fact_claims(filed_date_key);
CREATE INDEX IF NOT EXISTS fact_sales_customer_idx  ON fact_sales(customer_key);
CREATE INDEX IF NOT EXISTS fact_sales_book_idx      ON fact_sales(book_key);
CREATE INDEX IF NOT EXISTS fact_sales_author_idx    ON fact_sales(author_key);
CREATE INDEX IF NOT EXISTS fact_sales_date_idx      ON fact_sales(date_key);

PRAGMA user_version = 1;
";

// ─── Table metadata ──────────────────────────────────────────────────────────

/// Names of a dimension table and its two key columns.
#[derive(Debug, Clone, Copy)]
pub struct DimensionTable {
  pub name:         &'static str,
  pub key:          &'static str,
  pub business_key: &'static str,
}

pub fn dimension_table(entity: EntityType) -> DimensionTable {
  let (name, key) = match entity {
    EntityType::Customer => ("dim_customer", "customer_key"),
    EntityType::Policy => ("dim_policy", "policy_key"),
    EntityType::Agent => ("dim_agent", "agent_key"),
    EntityType::Book => ("dim_book", "book_key"),
    EntityType::Author => ("dim_author", "author_key"),
  };
  DimensionTable { name, key, business_key: entity.business_key_field() }
}

pub fn fact_table(kind: FactKind) -> (&'static str, &'static str) {
  match kind {
    FactKind::Claim => ("fact_claims", "claim_id"),
    FactKind::Sale => ("fact_sales", "order_id"),
  }
}

/// Deletion order for a full reload: facts before the dimensions they
/// reference. The calendar is static reference data and survives a reload.
pub const TRUNCATE_ORDER: &[&str] = &[
  "fact_claims",
  "fact_sales",
  "dim_customer",
  "dim_policy",
  "dim_agent",
  "dim_book",
  "dim_author",
];
