//! starload binary.
//!
//! Reads `starload.toml` (or the path given with `--config`), opens the SQLite
//! warehouse and loads one transformed-data bundle into it.
//!
//! ```sh
//! cargo run -p starload-cli --bin starload -- --input transformed.json
//! ```

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::Context as _;
use clap::Parser;
use starload_cli::{Pipeline, PipelineConfig, TransformedData};
use starload_store_sqlite::SqliteWarehouse;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Load transformed data into a star-schema warehouse")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "starload.toml")]
  config: PathBuf,

  /// Transformed-data bundle (JSON). Overrides `input_path`.
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// SQLite warehouse file. Overrides `warehouse_path`.
  #[arg(short, long)]
  warehouse: Option<PathBuf>,

  /// Records per chunk (1..=10000). Overrides `batch_size`.
  #[arg(long)]
  batch_size: Option<usize>,

  /// Truncate every fact and dimension table before loading.
  #[arg(long)]
  reload: bool,

  /// Do not populate the date dimension.
  #[arg(long)]
  no_calendar: bool,

  /// Write the run report as JSON to this path.
  #[arg(long)]
  report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration, then apply command-line overrides.
  let mut cfg = PipelineConfig::load(&cli.config).context("failed to read configuration")?;
  if let Some(input) = cli.input {
    cfg.input_path = Some(input);
  }
  if let Some(warehouse) = cli.warehouse {
    cfg.warehouse_path = warehouse;
  }
  if let Some(batch_size) = cli.batch_size {
    cfg.batch_size = batch_size;
  }
  cfg.reload |= cli.reload;
  if cli.no_calendar {
    cfg.calendar.populate = false;
  }
  cfg.validate().context("invalid configuration")?;

  let input_path = cfg
    .input_path
    .as_deref()
    .map(expand_tilde)
    .context("no input bundle; pass --input or set input_path")?;
  let data = TransformedData::from_path(&input_path)?;

  // Open SQLite warehouse.
  let warehouse_path = expand_tilde(&cfg.warehouse_path);
  let warehouse = SqliteWarehouse::open(&warehouse_path)
    .await
    .with_context(|| format!("failed to open warehouse at {warehouse_path:?}"))?;

  let report = Pipeline::new(warehouse, cfg).run(data).await;

  if let Some(path) = cli.report {
    let json = report.to_json().context("failed to serialise run report")?;
    std::fs::write(&path, json)
      .with_context(|| format!("failed to write run report to {path:?}"))?;
  }

  Ok(if report.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
