//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// A document row reused an id already present in the table. The first
  /// record is kept; the rejected row is the caller's to report.
  #[error("duplicate document id: {0}")]
  DuplicateDocumentId(u64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
