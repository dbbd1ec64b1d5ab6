//! `tally summary` — every report in sequence, closed by totals and
//! recommendations.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tally_core::{
  index::CodeIndex,
  integrity::{self, IntegrityReport},
  similarity,
};

use crate::{config::Settings, output, render};

use super::{names::NamesReport, overlap::OverlapReport};

#[derive(Serialize)]
pub struct SummaryReport {
  pub integrity:       IntegrityReport,
  pub names:           NamesReport,
  pub overlap:         OverlapReport,
  pub recommendations: Vec<String>,
}

pub fn run(
  dump: &Path,
  settings: Settings,
  json: bool,
  threshold: Option<f64>,
  min_shared: Option<usize>,
  min_pct: Option<f64>,
) -> Result<()> {
  let settings = settings.with_overrides(threshold, min_shared, min_pct)?;
  let parsed = super::load_dump(dump)?;
  let index = CodeIndex::build(&parsed.data);

  let integrity = integrity::analyze(&parsed.data, &index);
  let names = NamesReport {
    threshold:  settings.name_similarity,
    mismatches: similarity::find_mismatches(
      &parsed.data.documents,
      settings.name_similarity,
    ),
  };
  let overlap = OverlapReport {
    min_shared: settings.overlap_min_shared,
    min_pct:    settings.overlap_min_pct,
    ranking:    similarity::rank_duplicated_codes(&index),
    pairs:      similarity::find_overlaps(
      &index,
      settings.overlap_min_shared,
      settings.overlap_min_pct,
    ),
  };
  let recommendations = recommendations(&integrity, &names, &overlap);

  let report = SummaryReport { integrity, names, overlap, recommendations };

  if json {
    output::print_envelope(dump, "summary", &parsed.report, &report)?;
  } else {
    let mut text =
      render::integrity(&report.integrity, &parsed.data.documents, &settings);
    text.push('\n');
    text.push_str(&render::names(
      &report.names.mismatches,
      report.names.threshold,
      &settings,
    ));
    text.push('\n');
    text.push_str(&render::overlap(
      &report.overlap.ranking,
      &report.overlap.pairs,
      &parsed.data.documents,
      &settings,
    ));
    text.push('\n');
    text.push_str(&render::summary(
      &report.integrity,
      report.names.mismatches.len(),
      report.overlap.pairs.len(),
      &report.recommendations,
    ));
    text.push_str(&render::parser_warnings(&parsed.report, &settings));
    print!("{text}");
  }
  Ok(())
}

/// Plain-language follow-ups, one per problem class actually present.
fn recommendations(
  integrity: &IntegrityReport,
  names: &NamesReport,
  overlap: &OverlapReport,
) -> Vec<String> {
  let mut lines = Vec::new();
  if !overlap.ranking.is_empty() {
    lines.push(
      "Review the most duplicated codes; they may be assigned to the wrong \
       documents."
        .to_string(),
    );
  }
  if !overlap.pairs.is_empty() {
    lines.push(
      "Verify document pairs sharing many codes; one of each pair may hold \
       the other's codes."
        .to_string(),
    );
  }
  if !names.mismatches.is_empty() {
    lines.push(
      "Check that table names point at the right PDF files.".to_string(),
    );
  }
  if !integrity.orphaned_references.is_empty() {
    lines.push(
      "Re-point or remove codes that reference missing documents.".to_string(),
    );
  }
  if !integrity.documents_without_codes.is_empty() {
    lines.push("Assign codes to documents that have none.".to_string());
  }
  if lines.is_empty() {
    lines.push(
      "No structural problems detected; validate codes against the PDF \
       contents for full certainty."
        .to_string(),
    );
  }
  lines
}
