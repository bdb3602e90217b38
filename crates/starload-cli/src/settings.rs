//! Runtime configuration, deserialised from `starload.toml` and `STARLOAD_*`
//! environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `STARLOAD_CALENDAR__POPULATE=false`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;
use starload_core::batch::BatchSize;

use crate::{Error, Result};

const DEFAULT_CALENDAR_START: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
  Some(date) => date,
  None => panic!("invalid default calendar start"),
};

const DEFAULT_CALENDAR_END: NaiveDate = match NaiveDate::from_ymd_opt(2025, 12, 31) {
  Some(date) => date,
  None => panic!("invalid default calendar end"),
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// SQLite file holding the warehouse.
  pub warehouse_path:    PathBuf,
  /// Transformed-data bundle to load.
  pub input_path:        Option<PathBuf>,
  pub batch_size:        usize,
  /// Minimum acceptable fact success rate, in percent.
  pub quality_threshold: f64,
  /// Fail the run when any orphaned fact reference is found.
  pub strict_integrity:  bool,
  /// Truncate every fact and dimension table before loading.
  pub reload:            bool,
  pub calendar:          CalendarConfig,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      warehouse_path:    PathBuf::from("starload.db"),
      input_path:        None,
      batch_size:        BatchSize::DEFAULT,
      quality_threshold: 90.0,
      strict_integrity:  true,
      reload:            false,
      calendar:          CalendarConfig::default(),
    }
  }
}

/// Date dimension range populated ahead of the fact phase.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
  pub populate: bool,
  pub start:    NaiveDate,
  pub end:      NaiveDate,
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      populate: true,
      start:    DEFAULT_CALENDAR_START,
      end:      DEFAULT_CALENDAR_END,
    }
  }
}

impl PipelineConfig {
  /// Read `path` (optional) layered under the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_source(File::from(path).required(false))
  }

  fn from_source(file: impl Source + Send + Sync + 'static) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("STARLOAD")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn batch_size(&self) -> Result<BatchSize> { Ok(BatchSize::new(self.batch_size)?) }

  pub fn validate(&self) -> Result<()> {
    self.batch_size()?;

    if !(0.0..=100.0).contains(&self.quality_threshold) {
      return Err(Error::Config(format!(
        "quality_threshold must be between 0 and 100, got {}",
        self.quality_threshold
      )));
    }
    if self.calendar.populate && self.calendar.start >= self.calendar.end {
      return Err(Error::Config(format!(
        "calendar start {} must be before end {}",
        self.calendar.start, self.calendar.end
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn from_toml(toml: &str) -> PipelineConfig {
    PipelineConfig::from_source(File::from_str(toml, FileFormat::Toml)).unwrap()
  }

  #[test]
  fn defaults_are_valid() {
    let cfg = from_toml("");
    assert_eq!(cfg.batch_size, 1000);
    assert_eq!(cfg.quality_threshold, 90.0);
    assert!(cfg.strict_integrity);
    assert!(cfg.calendar.populate);
    assert_eq!(cfg.calendar.start, DEFAULT_CALENDAR_START);
    cfg.validate().unwrap();
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = from_toml(
      r#"
      warehouse_path = "/tmp/dw.db"
      batch_size = 250
      strict_integrity = false

      [calendar]
      start = "2023-01-01"
      end = "2023-12-31"
      "#,
    );
    assert_eq!(cfg.warehouse_path, PathBuf::from("/tmp/dw.db"));
    assert_eq!(cfg.batch_size, 250);
    assert!(!cfg.strict_integrity);
    assert_eq!(cfg.calendar.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    assert!(cfg.calendar.populate);
  }

  #[test]
  fn out_of_range_batch_size_is_rejected() {
    assert!(from_toml("batch_size = 0").validate().is_err());
    assert!(from_toml("batch_size = 10001").validate().is_err());
    assert!(from_toml("batch_size = 10000").validate().is_ok());
  }

  #[test]
  fn inverted_calendar_is_rejected_only_when_populating() {
    let inverted = "[calendar]\nstart = \"2025-01-01\"\nend = \"2024-01-01\"\n";
    assert!(from_toml(inverted).validate().is_err());

    let skipped = format!("{inverted}populate = false\n");
    assert!(from_toml(&skipped).validate().is_ok());
  }

  #[test]
  fn threshold_must_be_a_percentage() {
    assert!(from_toml("quality_threshold = 120.0").validate().is_err());
  }
}
