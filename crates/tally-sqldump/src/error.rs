//! Error types for `tally-sqldump`.
//!
//! These describe why a single tuple failed; the top-level [`crate::parse`]
//! converts them into [`crate::SkippedTuple`] entries instead of aborting.

use thiserror::Error;

use crate::TableKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("line {line}: expected {expected}, found {found}")]
  Unexpected {
    line:     usize,
    expected: &'static str,
    found:    String,
  },

  #[error("line {line}: unterminated string literal")]
  UnterminatedString { line: usize },

  /// Recovery ran into the next statement; the rest of this one is dropped.
  #[error("line {line}: rest of statement abandoned")]
  AbandonedTail { line: usize },

  #[error("line {line}: integer out of range: {text}")]
  IntegerOutOfRange { line: usize, text: String },

  #[error("line {line}: {table} tuple has {found} values, expected {expected}")]
  WrongArity {
    line:     usize,
    table:    TableKind,
    expected: usize,
    found:    usize,
  },

  #[error("line {line}: {table}.{column} must be {expected}")]
  ColumnType {
    line:     usize,
    table:    TableKind,
    column:   &'static str,
    expected: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
