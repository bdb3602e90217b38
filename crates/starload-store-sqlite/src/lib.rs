//! SQLite backend for the starload warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every loader operation is a single
//! `call` holding one [`rusqlite::Transaction`]; dropping it without a commit
//! rolls the whole operation back.

mod calendar;
mod dimension;
mod encode;
mod fact;
mod integrity;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteWarehouse;
