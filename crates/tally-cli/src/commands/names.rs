//! `tally names` — table names checked against file names.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tally_core::similarity::{self, NameMismatch};

use crate::{config::Settings, output, render};

#[derive(Serialize)]
pub struct NamesReport {
  pub threshold:  f64,
  pub mismatches: Vec<NameMismatch>,
}

pub fn run(
  dump: &Path,
  settings: Settings,
  json: bool,
  threshold: Option<f64>,
) -> Result<()> {
  let settings = settings.with_overrides(threshold, None, None)?;
  let parsed = super::load_dump(dump)?;

  let report = NamesReport {
    threshold:  settings.name_similarity,
    mismatches: similarity::find_mismatches(
      &parsed.data.documents,
      settings.name_similarity,
    ),
  };

  if json {
    output::print_envelope(dump, "names", &parsed.report, &report)?;
  } else {
    let mut text =
      render::names(&report.mismatches, report.threshold, &settings);
    text.push_str(&render::parser_warnings(&parsed.report, &settings));
    print!("{text}");
  }
  Ok(())
}
