//! Error type for the orchestration layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("core error: {0}")]
  Core(#[from] starload_core::Error),

  #[error("failed to read input {path:?}: {source}")]
  ReadInput {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse input {path:?}: {source}")]
  ParseInput {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("warehouse error: {0}")]
  Warehouse(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("referential integrity check failed: {0} orphaned reference(s)")]
  Integrity(u64),
}

impl Error {
  /// Wrap a backend error; the backend's concrete type is erased.
  pub fn warehouse(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Warehouse(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
