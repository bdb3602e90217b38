//! Core types and trait definitions for the starload warehouse loader.
//!
//! This crate is deliberately free of database dependencies. It owns the
//! dimension and fact record shapes, the surrogate key directory, the fact
//! resolver and the statistics produced by a load. Storage backends (e.g.
//! `starload-store-sqlite`) implement the [`store::Warehouse`] trait.

// Backends implement `Warehouse` with plain `async fn`; the trait spells out
// the `Send` bound on each returned future itself.
#![allow(async_fn_in_trait)]

pub mod batch;
pub mod date_key;
pub mod dimension;
pub mod directory;
pub mod entity;
pub mod error;
pub mod fact;
pub mod integrity;
pub mod resolve;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
