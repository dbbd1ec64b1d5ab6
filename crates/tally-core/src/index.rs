//! Derived lookup views over parsed dump data.
//!
//! Built in one pass and never mutated afterwards. Both views preserve
//! encounter order so every downstream report stays deterministic: documents
//! appear in first-reference order, codes in first-occurrence order.

use std::collections::HashMap;

use crate::record::DumpData;

/// Code assignments grouped two ways: per document and per code string.
///
/// Borrows the code strings from the parsed data rather than cloning them;
/// the index lives strictly shorter than the `DumpData` it was built from.
pub struct CodeIndex<'a> {
  /// document_id → codes assigned to it, in encounter order. Duplicate
  /// assignments of one code to the same document are preserved.
  by_document: Vec<(u64, Vec<&'a str>)>,
  doc_pos:     HashMap<u64, usize>,
  /// code string → distinct referencing document_ids, in encounter order.
  occurrences: Vec<(&'a str, Vec<u64>)>,
}

impl<'a> CodeIndex<'a> {
  pub fn build(data: &'a DumpData) -> Self {
    let mut by_document: Vec<(u64, Vec<&'a str>)> = Vec::new();
    let mut doc_pos: HashMap<u64, usize> = HashMap::new();
    let mut occurrences: Vec<(&'a str, Vec<u64>)> = Vec::new();
    let mut code_pos: HashMap<&'a str, usize> = HashMap::new();

    for code in &data.codes {
      let text = code.code.as_str();

      let dpos = *doc_pos.entry(code.document_id).or_insert_with(|| {
        by_document.push((code.document_id, Vec::new()));
        by_document.len() - 1
      });
      by_document[dpos].1.push(text);

      let cpos = *code_pos.entry(text).or_insert_with(|| {
        occurrences.push((text, Vec::new()));
        occurrences.len() - 1
      });
      let ids = &mut occurrences[cpos].1;
      // Occurrence lists stay tiny (a handful of documents per code), so a
      // linear containment check beats a set here.
      if !ids.contains(&code.document_id) {
        ids.push(code.document_id);
      }
    }

    Self { by_document, doc_pos, occurrences }
  }

  /// Codes assigned to `document_id`, or an empty slice if it has none.
  pub fn codes_for(&self, document_id: u64) -> &[&'a str] {
    self
      .doc_pos
      .get(&document_id)
      .map(|&pos| self.by_document[pos].1.as_slice())
      .unwrap_or(&[])
  }

  /// Every referenced document with its codes, in first-reference order.
  /// Entries always carry at least one code.
  pub fn by_document(&self) -> &[(u64, Vec<&'a str>)] { &self.by_document }

  /// Every code with its distinct referencing documents, in first-occurrence
  /// order.
  pub fn occurrences(&self) -> &[(&'a str, Vec<u64>)] { &self.occurrences }
}
