//! Referential-integrity and duplication statistics over a parsed dump.
//!
//! Everything here is a pure pass over [`DumpData`] plus its [`CodeIndex`];
//! empty inputs degenerate to empty report fields, never errors. Orderings
//! are fixed so renderings and JSON output are reproducible run to run.

use std::fmt;

use serde::Serialize;

use crate::{index::CodeIndex, record::DumpData};

// Codes shorter/longer than these character counts are flagged.
const MIN_CODE_CHARS: usize = 2;
const MAX_CODE_CHARS: usize = 30;

// ─── Report entry types ──────────────────────────────────────────────────────

/// Why a code was flagged as suspicious. Rules are checked in declaration
/// order and the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionReason {
  TooShort,
  TooLong,
  SpecialCharacters,
}

impl fmt::Display for SuspicionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Self::TooShort => "too short",
      Self::TooLong => "too long",
      Self::SpecialCharacters => "special characters",
    };
    f.write_str(text)
  }
}

/// A code whose text looks hand-mangled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspiciousCode {
  pub code:        String,
  pub document_id: u64,
  pub reason:      SuspicionReason,
}

/// A code referenced by more than one distinct document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCode {
  pub code:         String,
  /// Distinct referencing documents, in encounter order.
  pub document_ids: Vec<u64>,
}

/// A document_id referenced from `codes` but missing from `documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedReference {
  pub document_id: u64,
  /// Every code row pointing at the missing document, in encounter order.
  pub codes:       Vec<String>,
}

/// A document together with how many code rows reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentCodeCount {
  pub document_id: u64,
  pub count:       usize,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Aggregate integrity findings for one dump.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
  pub total_documents: usize,
  pub total_codes:     usize,
  /// 0.0 when there are no documents.
  pub average_codes_per_document: f64,
  /// Document ids with zero associated codes, in encounter order.
  pub documents_without_codes: Vec<u64>,
  /// Sorted by code string ascending.
  pub duplicate_codes: Vec<DuplicateCode>,
  /// Documents with at least one code, descending by count, ties in
  /// encounter order.
  pub top_documents_by_code_count: Vec<DocumentCodeCount>,
  /// In code-row encounter order.
  pub suspicious_codes: Vec<SuspiciousCode>,
  /// Sorted by document_id ascending.
  pub orphaned_references: Vec<OrphanedReference>,
}

/// Compute the full integrity report for one parsed dump.
pub fn analyze(data: &DumpData, index: &CodeIndex) -> IntegrityReport {
  let total_documents = data.documents.len();
  let total_codes = data.codes.len();
  let average_codes_per_document = if total_documents == 0 {
    0.0
  } else {
    total_codes as f64 / total_documents as f64
  };

  let documents_without_codes: Vec<u64> = data
    .documents
    .iter()
    .filter(|doc| index.codes_for(doc.id).is_empty())
    .map(|doc| doc.id)
    .collect();

  let mut duplicate_codes: Vec<DuplicateCode> = index
    .occurrences()
    .iter()
    .filter(|(_, ids)| ids.len() > 1)
    .map(|(code, ids)| DuplicateCode {
      code:         (*code).to_string(),
      document_ids: ids.clone(),
    })
    .collect();
  duplicate_codes.sort_by(|a, b| a.code.cmp(&b.code));

  let mut top_documents_by_code_count: Vec<DocumentCodeCount> = data
    .documents
    .iter()
    .map(|doc| DocumentCodeCount {
      document_id: doc.id,
      count:       index.codes_for(doc.id).len(),
    })
    .filter(|entry| entry.count > 0)
    .collect();
  // Stable sort: ties keep table encounter order.
  top_documents_by_code_count.sort_by(|a, b| b.count.cmp(&a.count));

  let suspicious_codes: Vec<SuspiciousCode> = data
    .codes
    .iter()
    .filter_map(|code| {
      suspicion_for(&code.code).map(|reason| SuspiciousCode {
        code: code.code.clone(),
        document_id: code.document_id,
        reason,
      })
    })
    .collect();

  let mut orphaned_references: Vec<OrphanedReference> = index
    .by_document()
    .iter()
    .filter(|(id, _)| !data.documents.contains(*id))
    .map(|(id, codes)| OrphanedReference {
      document_id: *id,
      codes:       codes.iter().map(|c| (*c).to_string()).collect(),
    })
    .collect();
  orphaned_references.sort_by_key(|orphan| orphan.document_id);

  IntegrityReport {
    total_documents,
    total_codes,
    average_codes_per_document,
    documents_without_codes,
    duplicate_codes,
    top_documents_by_code_count,
    suspicious_codes,
    orphaned_references,
  }
}

fn suspicion_for(code: &str) -> Option<SuspicionReason> {
  let chars = code.chars().count();
  if chars < MIN_CODE_CHARS {
    Some(SuspicionReason::TooShort)
  } else if chars > MAX_CODE_CHARS {
    Some(SuspicionReason::TooLong)
  } else if !code.chars().all(is_allowed_char) {
    Some(SuspicionReason::SpecialCharacters)
  } else {
    None
  }
}

fn is_allowed_char(c: char) -> bool {
  c.is_ascii_alphanumeric()
    || matches!(c, ':' | '+' | '-' | '/' | '.' | '(' | ')')
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Code, Document, DumpData};

  fn doc(id: u64, name: &str) -> Document {
    Document {
      id,
      name: name.to_string(),
      date: "2024-01-01".to_string(),
      path: format!("{id}_{name}.pdf"),
      extracted_codes: None,
    }
  }

  fn code(id: u64, document_id: u64, text: &str) -> Code {
    Code { id, document_id, code: text.to_string() }
  }

  fn dump(docs: Vec<Document>, codes: Vec<Code>) -> DumpData {
    let mut data = DumpData { codes, ..Default::default() };
    for d in docs {
      data.documents.insert(d).unwrap();
    }
    data
  }

  fn report_for(data: &DumpData) -> IntegrityReport {
    let index = CodeIndex::build(data);
    analyze(data, &index)
  }

  // ── Statistics ───────────────────────────────────────────────────────────

  #[test]
  fn empty_input_degenerates_to_empty_report() {
    let report = report_for(&DumpData::default());

    assert_eq!(report.total_documents, 0);
    assert_eq!(report.total_codes, 0);
    assert_eq!(report.average_codes_per_document, 0.0);
    assert!(report.documents_without_codes.is_empty());
    assert!(report.duplicate_codes.is_empty());
    assert!(report.top_documents_by_code_count.is_empty());
    assert!(report.suspicious_codes.is_empty());
    assert!(report.orphaned_references.is_empty());
  }

  #[test]
  fn average_divides_codes_by_documents() {
    let data = dump(
      vec![doc(1, "a"), doc(2, "b")],
      vec![code(1, 1, "X1"), code(2, 1, "X2"), code(3, 2, "X3")],
    );
    let report = report_for(&data);

    assert_eq!(report.total_documents, 2);
    assert_eq!(report.total_codes, 3);
    assert_eq!(report.average_codes_per_document, 1.5);
  }

  // ── Documents without codes ──────────────────────────────────────────────

  #[test]
  fn partitions_documents_by_code_presence() {
    let data = dump(
      vec![doc(1, "a"), doc(2, "b"), doc(3, "c")],
      vec![code(1, 2, "X1")],
    );
    let report = report_for(&data);

    assert_eq!(report.documents_without_codes, vec![1, 3]);

    // Every document is either without codes or has a non-empty code list.
    let index = CodeIndex::build(&data);
    let with_codes = data
      .documents
      .iter()
      .filter(|d| !index.codes_for(d.id).is_empty())
      .count();
    assert_eq!(
      report.documents_without_codes.len() + with_codes,
      data.documents.len()
    );
  }

  // ── Duplicate codes ──────────────────────────────────────────────────────

  #[test]
  fn duplicates_require_more_than_one_distinct_document() {
    let data = dump(
      vec![doc(10, "a"), doc(20, "b"), doc(30, "c")],
      vec![code(1, 10, "ABC"), code(2, 20, "ABC"), code(3, 30, "XYZ")],
    );
    let report = report_for(&data);

    assert_eq!(report.duplicate_codes.len(), 1);
    assert_eq!(report.duplicate_codes[0].code, "ABC");
    assert_eq!(report.duplicate_codes[0].document_ids, vec![10, 20]);
  }

  #[test]
  fn repeated_assignment_to_one_document_is_not_a_duplicate() {
    let data = dump(
      vec![doc(10, "a")],
      vec![code(1, 10, "ABC"), code(2, 10, "ABC")],
    );
    let report = report_for(&data);

    assert!(report.duplicate_codes.is_empty());
  }

  #[test]
  fn duplicates_sort_by_code_string() {
    let data = dump(
      vec![doc(1, "a"), doc(2, "b")],
      vec![
        code(1, 1, "ZZ"),
        code(2, 2, "ZZ"),
        code(3, 1, "AA"),
        code(4, 2, "AA"),
      ],
    );
    let report = report_for(&data);

    let codes: Vec<&str> =
      report.duplicate_codes.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["AA", "ZZ"]);
  }

  // ── Top documents ────────────────────────────────────────────────────────

  #[test]
  fn top_documents_sort_descending_with_stable_ties() {
    let data = dump(
      vec![doc(1, "a"), doc(2, "b"), doc(3, "c"), doc(4, "d")],
      vec![
        code(1, 1, "X1"),
        code(2, 3, "X2"),
        code(3, 3, "X3"),
        code(4, 2, "X4"),
      ],
    );
    let report = report_for(&data);

    let order: Vec<(u64, usize)> = report
      .top_documents_by_code_count
      .iter()
      .map(|t| (t.document_id, t.count))
      .collect();
    // Doc 3 leads with two codes; docs 1 and 2 tie and keep table order.
    // Doc 4 has no codes and does not rank.
    assert_eq!(order, vec![(3, 2), (1, 1), (2, 1)]);
  }

  // ── Suspicious codes ─────────────────────────────────────────────────────

  #[test]
  fn suspicion_rules_apply_in_order() {
    assert_eq!(suspicion_for(""), Some(SuspicionReason::TooShort));
    assert_eq!(suspicion_for("A"), Some(SuspicionReason::TooShort));
    assert_eq!(
      suspicion_for(&"A".repeat(31)),
      Some(SuspicionReason::TooLong)
    );
    // Too-long wins over special characters.
    assert_eq!(
      suspicion_for(&"Ä".repeat(31)),
      Some(SuspicionReason::TooLong)
    );
    assert_eq!(
      suspicion_for("AB CD"),
      Some(SuspicionReason::SpecialCharacters)
    );
    assert_eq!(suspicion_for("AB:12+x/y.(z)-9"), None);
    assert_eq!(suspicion_for("OK"), None);
  }

  #[test]
  fn suspicious_codes_keep_encounter_order() {
    let data = dump(
      vec![doc(1, "a")],
      vec![code(1, 1, "A B"), code(2, 1, "FINE"), code(3, 1, "X")],
    );
    let report = report_for(&data);

    let flagged: Vec<(&str, SuspicionReason)> = report
      .suspicious_codes
      .iter()
      .map(|s| (s.code.as_str(), s.reason))
      .collect();
    assert_eq!(flagged, vec![
      ("A B", SuspicionReason::SpecialCharacters),
      ("X", SuspicionReason::TooShort),
    ]);
  }

  // ── Orphaned references ──────────────────────────────────────────────────

  #[test]
  fn orphans_are_referenced_ids_missing_from_documents() {
    let data = dump(
      vec![doc(10, "a"), doc(20, "b")],
      vec![code(1, 10, "X1"), code(2, 20, "X2"), code(3, 30, "X3")],
    );
    let report = report_for(&data);

    assert_eq!(report.orphaned_references.len(), 1);
    assert_eq!(report.orphaned_references[0].document_id, 30);
    assert_eq!(report.orphaned_references[0].codes, vec!["X3"]);

    // No orphan id is in the table; every referenced table id is no orphan.
    for orphan in &report.orphaned_references {
      assert!(!data.documents.contains(orphan.document_id));
    }
  }

  #[test]
  fn orphans_sort_by_id_and_keep_code_rows() {
    let data = dump(vec![], vec![
      code(1, 99, "B"),
      code(2, 5, "A"),
      code(3, 99, "B"),
    ]);
    let report = report_for(&data);

    let ids: Vec<u64> =
      report.orphaned_references.iter().map(|o| o.document_id).collect();
    assert_eq!(ids, vec![5, 99]);
    // Duplicate rows under one orphan id are all listed.
    assert_eq!(report.orphaned_references[1].codes, vec!["B", "B"]);
  }
}
