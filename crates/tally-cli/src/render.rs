//! Plain-text rendering of analysis reports.
//!
//! Pure string builders: ordering comes from the analyzers, these apply
//! display caps and resolve document ids to names. Every capped section
//! ends with an "... and N more" line so nothing is dropped silently.

use tally_core::{
  integrity::IntegrityReport,
  record::DocumentTable,
  similarity::{CodeOverlap, NameMismatch, RankedCode},
};
use tally_sqldump::ParseReport;

use crate::config::Settings;

const BANNER_WIDTH: usize = 80;

// Per-section display caps; `--limit` (or `display.limit` in the config
// file) replaces all of them at once.
const WITHOUT_CODES_CAP: usize = 10;
const DUPLICATE_CAP:     usize = 20;
const TOP_DOCUMENTS_CAP: usize = 10;
const SUSPICIOUS_CAP:    usize = 15;
const ORPHAN_CAP:        usize = 10;
const MISMATCH_CAP:      usize = 20;
const RANKING_CAP:       usize = 15;
const PAIR_CAP:          usize = 10;
const SKIPPED_CAP:       usize = 10;

// ─── Reports ──────────────────────────────────────────────────────────────────

pub fn integrity(
  report: &IntegrityReport,
  documents: &DocumentTable,
  settings: &Settings,
) -> String {
  let mut out = banner("DATABASE INTEGRITY REPORT");

  out.push_str("\nGENERAL STATISTICS:\n");
  out.push_str(&format!("   Total documents: {}\n", report.total_documents));
  out.push_str(&format!("   Total codes: {}\n", report.total_codes));
  out.push_str(&format!(
    "   Average codes per document: {:.1}\n",
    report.average_codes_per_document
  ));

  out.push_str("\nDOCUMENTS WITHOUT ASSIGNED CODES:\n");
  if report.documents_without_codes.is_empty() {
    out.push_str("   Every document has at least one code.\n");
  } else {
    let cap = settings.limit.unwrap_or(WITHOUT_CODES_CAP);
    for id in report.documents_without_codes.iter().take(cap) {
      match documents.get(*id) {
        Some(doc) => out.push_str(&format!(
          "   ID {}: {} ({})\n",
          doc.id, doc.name, doc.path
        )),
        None => out.push_str(&format!("   ID {id}\n")),
      }
    }
    push_more(&mut out, report.documents_without_codes.len(), cap, "   ");
  }

  out.push_str("\nDUPLICATE CODES (one code, several documents):\n");
  if report.duplicate_codes.is_empty() {
    out.push_str("   No duplicate codes.\n");
  } else {
    let cap = settings.limit.unwrap_or(DUPLICATE_CAP);
    for duplicate in report.duplicate_codes.iter().take(cap) {
      out.push_str(&format!(
        "   '{}' appears in {} documents:\n",
        duplicate.code,
        duplicate.document_ids.len()
      ));
      for id in &duplicate.document_ids {
        out.push_str(&format!(
          "      - ID {}: {}\n",
          id,
          doc_label(documents, *id)
        ));
      }
    }
    push_more(&mut out, report.duplicate_codes.len(), cap, "   ");
    out.push_str(&format!(
      "   TOTAL: {} distinct codes are duplicated\n",
      report.duplicate_codes.len()
    ));
  }

  out.push_str("\nTOP DOCUMENTS BY CODE COUNT:\n");
  if report.top_documents_by_code_count.is_empty() {
    out.push_str("   No document has codes.\n");
  } else {
    let cap = settings.limit.unwrap_or(TOP_DOCUMENTS_CAP);
    for (rank, entry) in
      report.top_documents_by_code_count.iter().take(cap).enumerate()
    {
      out.push_str(&format!(
        "   {}. {}: {} codes\n",
        rank + 1,
        doc_label(documents, entry.document_id),
        entry.count
      ));
    }
    push_more(&mut out, report.top_documents_by_code_count.len(), cap, "   ");
  }

  out.push_str("\nSUSPICIOUS CODES:\n");
  if report.suspicious_codes.is_empty() {
    out.push_str("   No suspicious codes.\n");
  } else {
    let cap = settings.limit.unwrap_or(SUSPICIOUS_CAP);
    for (rank, suspect) in
      report.suspicious_codes.iter().take(cap).enumerate()
    {
      out.push_str(&format!(
        "   {}. '{}' in document {}: {}\n",
        rank + 1,
        suspect.code,
        suspect.document_id,
        suspect.reason
      ));
    }
    push_more(&mut out, report.suspicious_codes.len(), cap, "   ");
  }

  out.push_str("\nORPHANED REFERENCES:\n");
  if report.orphaned_references.is_empty() {
    out.push_str("   Every code references an existing document.\n");
  } else {
    out.push_str(&format!(
      "   Codes point at {} missing documents:\n",
      report.orphaned_references.len()
    ));
    let cap = settings.limit.unwrap_or(ORPHAN_CAP);
    for orphan in report.orphaned_references.iter().take(cap) {
      let samples: Vec<&str> = orphan
        .codes
        .iter()
        .take(settings.samples)
        .map(String::as_str)
        .collect();
      out.push_str(&format!(
        "      ID {}: {} orphaned codes (samples: {})\n",
        orphan.document_id,
        orphan.codes.len(),
        samples.join(", ")
      ));
    }
    push_more(&mut out, report.orphaned_references.len(), cap, "      ");
  }

  out
}

pub fn names(
  mismatches: &[NameMismatch],
  threshold: f64,
  settings: &Settings,
) -> String {
  let mut out = banner("NAME MISMATCH REPORT");

  out.push_str(&format!("\nThreshold: similarity below {threshold:.2}\n"));
  out.push_str(&format!("Mismatches: {}\n\n", mismatches.len()));

  if mismatches.is_empty() {
    out.push_str("   Every document name matches its file name.\n");
    return out;
  }

  let cap = settings.limit.unwrap_or(MISMATCH_CAP);
  for (rank, mismatch) in mismatches.iter().take(cap).enumerate() {
    out.push_str(&format!(
      "   {}. Document {} (similarity {:.1}%)\n",
      rank + 1,
      mismatch.document_id,
      mismatch.similarity * 100.0
    ));
    out.push_str(&format!("      table name: '{}'\n", mismatch.name));
    out.push_str(&format!("      file name:  '{}'\n", mismatch.path_name));
    out.push_str(&format!("      path: {}\n", mismatch.path));
  }
  push_more(&mut out, mismatches.len(), cap, "   ");

  out
}

pub fn overlap(
  ranking: &[RankedCode],
  pairs: &[CodeOverlap],
  documents: &DocumentTable,
  settings: &Settings,
) -> String {
  let mut out = banner("CODE DUPLICATION REPORT");

  out.push_str("\nMOST DUPLICATED CODES:\n");
  if ranking.is_empty() {
    out.push_str("   No code is referenced by more than one document.\n");
  } else {
    let cap = settings.limit.unwrap_or(RANKING_CAP);
    for (rank, entry) in ranking.iter().take(cap).enumerate() {
      out.push_str(&format!(
        "   {}. '{}' appears in {} documents:\n",
        rank + 1,
        entry.code,
        entry.document_ids.len()
      ));
      for id in entry.document_ids.iter().take(settings.samples) {
        out.push_str(&format!(
          "      - {} (ID {})\n",
          doc_label(documents, *id),
          id
        ));
      }
      push_more(&mut out, entry.document_ids.len(), settings.samples, "      ");
    }
    push_more(&mut out, ranking.len(), cap, "   ");
  }

  out.push_str("\nDOCUMENT PAIRS SHARING CODES:\n");
  if pairs.is_empty() {
    out.push_str("   No document pair crosses the overlap thresholds.\n");
  } else {
    let cap = settings.limit.unwrap_or(PAIR_CAP);
    for (rank, pair) in pairs.iter().take(cap).enumerate() {
      out.push_str(&format!(
        "   {}. {} shared codes ({:.1}% of the smaller set)\n",
        rank + 1,
        pair.shared_count,
        pair.shared_pct
      ));
      out.push_str(&format!(
        "      first:  {} (ID {})\n",
        doc_label(documents, pair.first_id),
        pair.first_id
      ));
      out.push_str(&format!(
        "      second: {} (ID {})\n",
        doc_label(documents, pair.second_id),
        pair.second_id
      ));
      let samples: Vec<&str> = pair
        .shared_codes
        .iter()
        .take(settings.samples)
        .map(String::as_str)
        .collect();
      out.push_str(&format!("      samples: {}\n", samples.join(", ")));
    }
    push_more(&mut out, pairs.len(), cap, "   ");
  }

  out
}

pub fn summary(
  report: &IntegrityReport,
  mismatches: usize,
  overlapping_pairs: usize,
  recommendations: &[String],
) -> String {
  let mut out = banner("SUMMARY");

  out.push_str(&format!("\nDocuments: {}\n", report.total_documents));
  out.push_str(&format!("Codes: {}\n", report.total_codes));
  out.push_str(&format!(
    "Average codes per document: {:.1}\n",
    report.average_codes_per_document
  ));

  out.push_str("\nProblems found:\n");
  out.push_str(&format!(
    "   Documents without codes: {}\n",
    report.documents_without_codes.len()
  ));
  out.push_str(&format!(
    "   Duplicated codes: {}\n",
    report.duplicate_codes.len()
  ));
  out.push_str(&format!(
    "   Suspicious codes: {}\n",
    report.suspicious_codes.len()
  ));
  out.push_str(&format!(
    "   Orphaned references: {}\n",
    report.orphaned_references.len()
  ));
  out.push_str(&format!("   Name mismatches: {mismatches}\n"));
  out.push_str(&format!("   Overlapping pairs: {overlapping_pairs}\n"));

  out.push_str("\nRecommendations:\n");
  for (rank, recommendation) in recommendations.iter().enumerate() {
    out.push_str(&format!("   {}. {}\n", rank + 1, recommendation));
  }

  out
}

/// Anything the parser had to work around. Empty when the parse was clean
/// and block counts look normal.
pub fn parser_warnings(parse: &ParseReport, settings: &Settings) -> String {
  let mut lines = String::new();

  if parse.document_blocks == 0 {
    lines.push_str("   no documents INSERT block found\n");
  }
  if parse.document_blocks > 1 {
    lines.push_str(&format!(
      "   documents INSERT blocks: {} (only the first was ingested)\n",
      parse.document_blocks
    ));
  }
  if parse.code_blocks == 0 {
    lines.push_str("   no codes INSERT block found\n");
  }
  if !parse.skipped.is_empty() {
    lines.push_str(&format!("   skipped tuples: {}\n", parse.skipped.len()));
    let cap = settings.limit.unwrap_or(SKIPPED_CAP);
    for skip in parse.skipped.iter().take(cap) {
      lines.push_str(&format!("      - {}: {}\n", skip.table, skip.reason));
      lines.push_str(&format!("        at: {}\n", skip.snippet));
    }
    push_more(&mut lines, parse.skipped.len(), cap, "      ");
  }
  if !parse.duplicate_document_ids.is_empty() {
    let ids: Vec<String> = parse
      .duplicate_document_ids
      .iter()
      .map(u64::to_string)
      .collect();
    lines.push_str(&format!(
      "   duplicate document ids (first row kept): {}\n",
      ids.join(", ")
    ));
  }

  if lines.is_empty() {
    return String::new();
  }
  format!("\nPARSER WARNINGS:\n{lines}")
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn banner(title: &str) -> String {
  let rule = "=".repeat(BANNER_WIDTH);
  format!("{rule}\n{title}\n{rule}\n")
}

fn doc_label(documents: &DocumentTable, id: u64) -> String {
  match documents.get(id) {
    Some(doc) => doc.name.clone(),
    None => "(missing document)".to_string(),
  }
}

fn push_more(out: &mut String, total: usize, shown: usize, indent: &str) {
  if total > shown {
    out.push_str(&format!("{indent}... and {} more\n", total - shown));
  }
}
