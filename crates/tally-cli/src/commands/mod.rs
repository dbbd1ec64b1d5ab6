//! Subcommand implementations.

pub mod integrity;
pub mod names;
pub mod overlap;
pub mod summary;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use tally_sqldump::ParsedDump;
use tracing::{info, warn};

/// Read and parse the dump, surfacing parse anomalies on the log before
/// any report is printed.
fn load_dump(path: &Path) -> Result<ParsedDump> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading dump file {}", path.display()))?;
  let parsed = tally_sqldump::parse(&raw);

  info!(
    documents = parsed.data.documents.len(),
    codes = parsed.data.codes.len(),
    "parsed dump"
  );
  if parsed.report.document_blocks == 0 {
    warn!("no documents INSERT block found");
  }
  if parsed.report.document_blocks > 1 {
    warn!(
      blocks = parsed.report.document_blocks,
      "multiple documents INSERT blocks; only the first was ingested"
    );
  }
  if parsed.report.code_blocks == 0 {
    warn!("no codes INSERT block found");
  }
  if !parsed.report.skipped.is_empty() {
    warn!(count = parsed.report.skipped.len(), "skipped malformed tuples");
  }
  if !parsed.report.duplicate_document_ids.is_empty() {
    warn!(
      count = parsed.report.duplicate_document_ids.len(),
      "duplicate document ids; first rows kept"
    );
  }

  Ok(parsed)
}
