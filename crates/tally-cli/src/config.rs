//! Threshold and display configuration.
//!
//! Resolution order for every knob: command-line flag, then config file,
//! then built-in default.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tally_core::similarity::{
  DEFAULT_MIN_OVERLAP_PCT, DEFAULT_MIN_SHARED_CODES,
  DEFAULT_SIMILARITY_THRESHOLD,
};

/// Sample values (codes, document names) listed under a single report entry.
pub const DEFAULT_SAMPLES: usize = 5;

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  thresholds: Thresholds,
  #[serde(default)]
  display:    Display,
}

#[derive(Deserialize, Default)]
struct Thresholds {
  name_similarity:    Option<f64>,
  overlap_min_shared: Option<usize>,
  overlap_min_pct:    Option<f64>,
}

#[derive(Deserialize, Default)]
struct Display {
  limit:   Option<usize>,
  samples: Option<usize>,
}

// ─── Resolved settings ────────────────────────────────────────────────────────

/// Config file values over built-in defaults. Per-command flags are merged
/// in afterwards with [`Settings::with_overrides`].
#[derive(Debug, Clone)]
pub struct Settings {
  pub name_similarity:    f64,
  pub overlap_min_shared: usize,
  pub overlap_min_pct:    f64,
  /// When set, caps every report section instead of the per-section
  /// defaults.
  pub limit:   Option<usize>,
  pub samples: usize,
}

pub fn load(path: Option<&Path>) -> Result<Settings> {
  let file: ConfigFile = match path {
    Some(path) => {
      let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
      toml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", path.display()))?
    }
    None => ConfigFile::default(),
  };
  resolve(file)
}

/// File values over built-in defaults, field by field, range-checked.
fn resolve(file: ConfigFile) -> Result<Settings> {
  let settings = Settings {
    name_similarity: file
      .thresholds
      .name_similarity
      .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
    overlap_min_shared: file
      .thresholds
      .overlap_min_shared
      .unwrap_or(DEFAULT_MIN_SHARED_CODES),
    overlap_min_pct: file
      .thresholds
      .overlap_min_pct
      .unwrap_or(DEFAULT_MIN_OVERLAP_PCT),
    limit: file.display.limit,
    samples: file.display.samples.unwrap_or(DEFAULT_SAMPLES),
  };
  validate(&settings)?;
  Ok(settings)
}

impl Settings {
  /// Apply per-command flag overrides, re-checking ranges afterwards.
  pub fn with_overrides(
    mut self,
    name_similarity: Option<f64>,
    overlap_min_shared: Option<usize>,
    overlap_min_pct: Option<f64>,
  ) -> Result<Self> {
    if let Some(value) = name_similarity {
      self.name_similarity = value;
    }
    if let Some(value) = overlap_min_shared {
      self.overlap_min_shared = value;
    }
    if let Some(value) = overlap_min_pct {
      self.overlap_min_pct = value;
    }
    validate(&self)?;
    Ok(self)
  }
}

fn validate(settings: &Settings) -> Result<()> {
  ensure!(
    (0.0..=1.0).contains(&settings.name_similarity),
    "name similarity threshold must be within [0, 1], got {}",
    settings.name_similarity
  );
  ensure!(
    (0.0..=100.0).contains(&settings.overlap_min_pct),
    "overlap percentage threshold must be within [0, 100], got {}",
    settings.overlap_min_pct
  );
  Ok(())
}
