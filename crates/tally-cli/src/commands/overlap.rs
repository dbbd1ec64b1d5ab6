//! `tally overlap` — code duplication ranking and document pairs.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tally_core::{
  index::CodeIndex,
  similarity::{self, CodeOverlap, RankedCode},
};

use crate::{config::Settings, output, render};

#[derive(Serialize)]
pub struct OverlapReport {
  pub min_shared: usize,
  pub min_pct:    f64,
  pub ranking:    Vec<RankedCode>,
  pub pairs:      Vec<CodeOverlap>,
}

pub fn run(
  dump: &Path,
  settings: Settings,
  json: bool,
  min_shared: Option<usize>,
  min_pct: Option<f64>,
) -> Result<()> {
  let settings = settings.with_overrides(None, min_shared, min_pct)?;
  let parsed = super::load_dump(dump)?;
  let index = CodeIndex::build(&parsed.data);

  let report = OverlapReport {
    min_shared: settings.overlap_min_shared,
    min_pct:    settings.overlap_min_pct,
    ranking:    similarity::rank_duplicated_codes(&index),
    pairs:      similarity::find_overlaps(
      &index,
      settings.overlap_min_shared,
      settings.overlap_min_pct,
    ),
  };

  if json {
    output::print_envelope(dump, "overlap", &parsed.report, &report)?;
  } else {
    let mut text = render::overlap(
      &report.ranking,
      &report.pairs,
      &parsed.data.documents,
      &settings,
    );
    text.push_str(&render::parser_warnings(&parsed.report, &settings));
    print!("{text}");
  }
  Ok(())
}
