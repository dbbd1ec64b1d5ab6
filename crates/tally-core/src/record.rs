//! Parsed record types and the id-unique document table.
//!
//! Records are immutable once parsed and live only for the analysis run.
//! `DocumentTable` preserves encounter order and rejects duplicate ids
//! instead of overwriting; the rejection surfaces as an error so the parser
//! can account for it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Records ─────────────────────────────────────────────────────────────────

/// One row of the `documents` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub id:              u64,
  /// Display name assigned by hand in the table.
  pub name:            String,
  /// Kept as raw text; never interpreted.
  pub date:            String,
  /// Stored file path, typically `<upload-timestamp>_<original name>.pdf`.
  pub path:            String,
  /// The only nullable column in the schema.
  pub extracted_codes: Option<String>,
}

/// One row of the `codes` table.
///
/// `document_id` is a foreign key that is not enforced at parse time.
/// Dangling references are tolerated here; detecting them is the integrity
/// analyzer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
  pub id:          u64,
  pub document_id: u64,
  pub code:        String,
}

// ─── Document table ──────────────────────────────────────────────────────────

/// Ordered, id-unique storage for documents.
///
/// Iteration yields documents in encounter order; lookup by id is O(1).
/// Inserting an id that is already present keeps the existing record and
/// returns [`Error::DuplicateDocumentId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTable {
  rows:  Vec<Document>,
  by_id: HashMap<u64, usize>,
}

impl DocumentTable {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, document: Document) -> Result<()> {
    if self.by_id.contains_key(&document.id) {
      return Err(Error::DuplicateDocumentId(document.id));
    }
    self.by_id.insert(document.id, self.rows.len());
    self.rows.push(document);
    Ok(())
  }

  pub fn get(&self, id: u64) -> Option<&Document> {
    self.by_id.get(&id).map(|&pos| &self.rows[pos])
  }

  pub fn contains(&self, id: u64) -> bool { self.by_id.contains_key(&id) }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Documents in encounter order.
  pub fn iter(&self) -> impl Iterator<Item = &Document> { self.rows.iter() }
}

// ─── Parsed dump ─────────────────────────────────────────────────────────────

/// Everything a dump parse extracts, ready for analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpData {
  pub documents: DocumentTable,
  pub codes:     Vec<Code>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(id: u64, name: &str) -> Document {
    Document {
      id,
      name: name.to_string(),
      date: "2024-01-01".to_string(),
      path: format!("{id}_{name}.pdf"),
      extracted_codes: None,
    }
  }

  #[test]
  fn insert_preserves_encounter_order() {
    let mut table = DocumentTable::new();
    table.insert(doc(3, "c")).unwrap();
    table.insert(doc(1, "a")).unwrap();
    table.insert(doc(2, "b")).unwrap();

    let ids: Vec<u64> = table.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(table.len(), 3);
  }

  #[test]
  fn duplicate_id_keeps_first_and_errors() {
    let mut table = DocumentTable::new();
    table.insert(doc(7, "first")).unwrap();
    let err = table.insert(doc(7, "second")).unwrap_err();

    assert!(matches!(err, Error::DuplicateDocumentId(7)));
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(7).unwrap().name, "first");
  }

  #[test]
  fn lookup_by_id() {
    let mut table = DocumentTable::new();
    table.insert(doc(10, "report")).unwrap();

    assert!(table.contains(10));
    assert!(!table.contains(11));
    assert_eq!(table.get(10).unwrap().name, "report");
    assert!(table.get(11).is_none());
  }
}
