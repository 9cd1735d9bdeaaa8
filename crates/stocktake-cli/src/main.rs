//! `stocktake` — scheduled catalog reconciliation job.
//!
//! Fetches the current products and collections from the storefront,
//! diffs them against the previously persisted snapshot, appends a
//! history ledger entry when anything changed, and emits a summary
//! report. Designed to be re-invoked by a scheduler; every error is
//! terminal for the run.
//!
//! # Usage
//!
//! ```
//! stocktake --config stocktake.toml
//! STOCKTAKE_BASE_URL=https://shop.example.com stocktake
//! ```

mod run;

use std::{
  io::Write as _,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;
use stocktake_shopify::CatalogClient;
use stocktake_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Storefront catalog snapshot and reconciliation job"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "stocktake.toml")]
  config: PathBuf,

  /// Override the storefront base URL.
  #[arg(long)]
  base_url: Option<String>,

  /// Override the SQLite database path.
  #[arg(long)]
  db_path: Option<PathBuf>,

  /// Skip writing the summary file.
  #[arg(long)]
  no_summary_file: bool,
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from the TOML file layered with
/// `STOCKTAKE_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
struct RunConfig {
  #[serde(default)]
  base_url:     Option<String>,
  #[serde(default = "default_db_path")]
  db_path:      PathBuf,
  #[serde(default = "default_summary_path")]
  summary_path: PathBuf,
}

fn default_db_path() -> PathBuf { PathBuf::from("data/stocktake.db") }

fn default_summary_path() -> PathBuf {
  PathBuf::from("data/latest_summary.txt")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("STOCKTAKE"))
    .build()
    .context("failed to read configuration")?;

  let run_cfg: RunConfig = settings
    .try_deserialize()
    .context("failed to deserialise RunConfig")?;

  // CLI flags override config file and environment.
  let base_url = cli.base_url.or(run_cfg.base_url).context(
    "no storefront base URL configured (use --base-url, \
     STOCKTAKE_BASE_URL, or base_url in the config file)",
  )?;
  let db_path = expand_tilde(&cli.db_path.unwrap_or(run_cfg.db_path));
  ensure_parent_dir(&db_path)?;

  let source =
    CatalogClient::new(&base_url).context("failed to build catalog client")?;
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  tracing::info!(%base_url, "starting catalog run");
  let outcome = run::execute(&source, &store, Utc::now()).await?;

  println!("{}", outcome.report);

  if !cli.no_summary_file {
    let summary_path = expand_tilde(&run_cfg.summary_path);
    ensure_parent_dir(&summary_path)?;
    std::fs::write(&summary_path, &outcome.report)
      .with_context(|| format!("failed to write {}", summary_path.display()))?;
  }

  write_ci_outputs(&outcome).context("failed to write GITHUB_OUTPUT")?;

  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Append the run's counts as `key=value` pairs for a CI orchestrator,
/// when `GITHUB_OUTPUT` points at its output file.
fn write_ci_outputs(outcome: &run::RunOutcome) -> anyhow::Result<()> {
  let Ok(path) = std::env::var("GITHUB_OUTPUT") else {
    return Ok(());
  };

  let mut file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)?;
  writeln!(file, "products_count={}", outcome.product_total)?;
  writeln!(file, "collections_count={}", outcome.collection_total)?;
  writeln!(file, "added_count={}", outcome.product_changes.added.len())?;
  writeln!(file, "removed_count={}", outcome.product_changes.removed.len())?;
  writeln!(file, "updated_count={}", outcome.product_changes.updated.len())?;
  Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  Ok(())
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
