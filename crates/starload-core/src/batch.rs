//! Chunk granularity for dimension and fact loads.

use std::num::NonZeroUsize;

use crate::{Error, Result};

/// Number of records processed per chunk.
///
/// Chunking exists for throughput and memory only; chunk boundaries never
/// change which records are inserted, updated or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
  pub const DEFAULT: usize = 1000;
  pub const MAX: usize = 10_000;

  pub fn new(size: usize) -> Result<Self> {
    if size > Self::MAX {
      return Err(Error::InvalidBatchSize(size));
    }
    NonZeroUsize::new(size)
      .map(Self)
      .ok_or(Error::InvalidBatchSize(size))
  }

  pub fn get(self) -> usize { self.0.get() }
}

impl Default for BatchSize {
  fn default() -> Self {
    Self(NonZeroUsize::new(Self::DEFAULT).unwrap_or(NonZeroUsize::MIN))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_is_one_thousand() {
    assert_eq!(BatchSize::default().get(), 1000);
  }

  #[test]
  fn rejects_zero_and_oversized() {
    assert!(matches!(BatchSize::new(0), Err(Error::InvalidBatchSize(0))));
    assert!(BatchSize::new(10_001).is_err());
    assert_eq!(BatchSize::new(10_000).unwrap().get(), 10_000);
    assert_eq!(BatchSize::new(1).unwrap().get(), 1);
  }
}
