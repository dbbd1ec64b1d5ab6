//! Parser for SQL dumps carrying the `documents` and `codes` tables.
//!
//! Pipeline:
//!   raw &str
//!     └─ Scanner                → bytes, line tracking, literals
//!          └─ parse_dump()      → per-statement recursive descent
//!               └─ ParsedDump   → records + skip/duplicate accounting
//!
//! The grammar is one fixed INSERT shape per table. Anything else in the
//! dump (CREATE TABLE, SET, INSERTs for other tables) is passed over
//! lexically. Absent headers yield empty tables, never errors; malformed
//! tuples are skipped one at a time and each skip is reported.

use std::fmt;

use serde::Serialize;
use tally_core::record::DumpData;

mod parse;
mod scan;

pub mod error;


pub use crate::error::{Error, Result};

// ─── Accounting types ────────────────────────────────────────────────────────

/// Which dump table a parse-report entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
  Documents,
  Codes,
}

impl fmt::Display for TableKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Documents => "documents",
      Self::Codes => "codes",
    })
  }
}

/// One tuple inside a recognized VALUES block that failed to parse and was
/// excluded from the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTuple {
  pub table:   TableKind,
  /// 1-based source line where the tuple starts.
  pub line:    usize,
  pub reason:  String,
  /// The first characters of the offending input, newlines flattened.
  pub snippet: String,
}

/// Everything the parser saw besides the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
  /// Matched `documents` INSERT headers. Only the first block is ingested;
  /// a count above 1 means the dump violates the single-block assumption.
  pub document_blocks: usize,
  /// Matched `codes` INSERT headers. All of them are ingested.
  pub code_blocks: usize,
  pub skipped: Vec<SkippedTuple>,
  /// Rejected ids from rows that reused an existing document id, in
  /// encounter order. The first row for an id always wins.
  pub duplicate_document_ids: Vec<u64>,
}

impl ParseReport {
  /// True when every tuple in every recognized block parsed cleanly.
  pub fn is_clean(&self) -> bool {
    self.skipped.is_empty() && self.duplicate_document_ids.is_empty()
  }
}

/// Extracted records plus the accounting for how they were extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDump {
  pub data:   DumpData,
  pub report: ParseReport,
}

/// Parse dump text into records.
///
/// This never fails as a whole: missing headers produce empty tables and
/// malformed tuples are skipped with a [`SkippedTuple`] entry each, so the
/// caller must inspect [`ParseReport`] to distinguish a clean empty dump
/// from a mangled one.
pub fn parse(text: &str) -> ParsedDump { parse::parse_dump(text) }
