//! `tally` — integrity reports for document/code SQL dumps.
//!
//! # Usage
//!
//! ```
//! tally integrity backup.sql
//! tally names backup.sql --threshold 0.8
//! tally overlap backup.sql --min-shared 12 --min-pct 10
//! tally summary backup.sql --json
//! ```

mod commands;
mod config;
mod output;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tally", about = "Integrity reports for document SQL dumps")]
struct Cli {
  /// Path to a TOML config file (thresholds, display limits).
  #[arg(short, long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Emit a machine-readable JSON report instead of text.
  #[arg(long, global = true)]
  json: bool,

  /// Cap every report section at N entries (overrides the per-section
  /// defaults and the config file).
  #[arg(long, global = true, value_name = "N")]
  limit: Option<usize>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Referential integrity: duplicates, orphans, documents without codes.
  Integrity {
    /// Path to the SQL dump file.
    #[arg(value_name = "DUMP", env = "TALLY_DUMP")]
    dump: PathBuf,
  },

  /// Documents whose table name diverges from their file name.
  Names {
    /// Path to the SQL dump file.
    #[arg(value_name = "DUMP", env = "TALLY_DUMP")]
    dump: PathBuf,

    /// Similarity threshold in [0, 1]; scores below it are mismatches.
    #[arg(long, value_name = "RATIO")]
    threshold: Option<f64>,
  },

  /// Code duplication ranking and document pairs sharing many codes.
  Overlap {
    /// Path to the SQL dump file.
    #[arg(value_name = "DUMP", env = "TALLY_DUMP")]
    dump: PathBuf,

    /// Minimum shared distinct codes for a pair to qualify.
    #[arg(long, value_name = "N")]
    min_shared: Option<usize>,

    /// Minimum shared share of the smaller code set, in percent.
    #[arg(long, value_name = "PCT")]
    min_pct: Option<f64>,
  },

  /// Every report in sequence, closed by totals and recommendations.
  Summary {
    /// Path to the SQL dump file.
    #[arg(value_name = "DUMP", env = "TALLY_DUMP")]
    dump: PathBuf,

    /// Similarity threshold in [0, 1]; scores below it are mismatches.
    #[arg(long, value_name = "RATIO")]
    threshold: Option<f64>,

    /// Minimum shared distinct codes for a pair to qualify.
    #[arg(long, value_name = "N")]
    min_shared: Option<usize>,

    /// Minimum shared share of the smaller code set, in percent.
    #[arg(long, value_name = "PCT")]
    min_pct: Option<f64>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  // Diagnostics go to stderr; stdout carries the report alone.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut settings = config::load(cli.config.as_deref())?;
  if cli.limit.is_some() {
    settings.limit = cli.limit;
  }
  let json = cli.json;

  match cli.command {
    Command::Integrity { dump } => {
      commands::integrity::run(&dump, settings, json)
    }
    Command::Names { dump, threshold } => {
      commands::names::run(&dump, settings, json, threshold)
    }
    Command::Overlap { dump, min_shared, min_pct } => {
      commands::overlap::run(&dump, settings, json, min_shared, min_pct)
    }
    Command::Summary { dump, threshold, min_shared, min_pct } => {
      commands::summary::run(
        &dump, settings, json, threshold, min_shared, min_pct,
      )
    }
  }
}
