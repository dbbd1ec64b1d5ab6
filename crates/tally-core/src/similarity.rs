//! Pairwise string similarity and code-set overlap between documents.
//!
//! The ratio is Ratcliff–Obershelp over lowercased characters: recursively
//! take the longest common block, then match the pieces on either side.
//! `2 * matches / (len_a + len_b)` lands in [0, 1], is symmetric, and is
//! 1.0 for identical strings.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{index::CodeIndex, record::DocumentTable};

/// Documents whose table name and path-derived name score below this are
/// reported as mismatches.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
/// Minimum shared distinct codes for a pair to count as overlapping.
pub const DEFAULT_MIN_SHARED_CODES: usize = 10;
/// Minimum shared share of the smaller code set, in percent.
pub const DEFAULT_MIN_OVERLAP_PCT: f64 = 5.0;

// ─── Similarity ratio ────────────────────────────────────────────────────────

/// Case-insensitive similarity of two strings in [0, 1].
///
/// Two empty strings count as identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
  let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
  let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
  if a.is_empty() && b.is_empty() {
    return 1.0;
  }
  2.0 * matching_chars(&a, &b) as f64 / (a.len() + b.len()) as f64
}

/// Total size of the longest-matching-block decomposition.
fn matching_chars(a: &[char], b: &[char]) -> usize {
  let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
  for (j, &c) in b.iter().enumerate() {
    b2j.entry(c).or_default().push(j);
  }

  let mut total = 0;
  let mut pending = vec![(0, a.len(), 0, b.len())];
  while let Some((alo, ahi, blo, bhi)) = pending.pop() {
    let (i, j, size) = longest_match(a, &b2j, alo, ahi, blo, bhi);
    if size == 0 {
      continue;
    }
    total += size;
    pending.push((alo, i, blo, j));
    pending.push((i + size, ahi, j + size, bhi));
  }
  total
}

/// Longest block with `a[i..i+size] == b[j..j+size]` inside the window
/// `a[alo..ahi]` × `b[blo..bhi]`. Earliest block in `a` (then `b`) wins ties.
fn longest_match(
  a: &[char],
  b2j: &HashMap<char, Vec<usize>>,
  alo: usize,
  ahi: usize,
  blo: usize,
  bhi: usize,
) -> (usize, usize, usize) {
  let mut best_i = alo;
  let mut best_j = blo;
  let mut best_size = 0;
  // run_ending_at[j] = length of the matching run ending at (i - 1, j).
  let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

  for i in alo..ahi {
    let mut next_runs: HashMap<usize, usize> = HashMap::new();
    if let Some(positions) = b2j.get(&a[i]) {
      for &j in positions {
        if j < blo {
          continue;
        }
        if j >= bhi {
          break;
        }
        let size = match j.checked_sub(1) {
          Some(prev) => run_ending_at.get(&prev).copied().unwrap_or(0) + 1,
          None => 1,
        };
        next_runs.insert(j, size);
        if size > best_size {
          best_i = i + 1 - size;
          best_j = j + 1 - size;
          best_size = size;
        }
      }
    }
    run_ending_at = next_runs;
  }

  (best_i, best_j, best_size)
}

// ─── Name mismatches ─────────────────────────────────────────────────────────

/// The display name a document's file path implies: upload-timestamp prefix
/// (`digits_`) and a trailing `.pdf` stripped, whitespace trimmed.
pub fn clean_path_name(path: &str) -> String {
  let mut name = path;
  let digits = name.chars().take_while(char::is_ascii_digit).count();
  if digits > 0 && name[digits..].starts_with('_') {
    name = &name[digits + 1..];
  }
  name = name.strip_suffix(".pdf").unwrap_or(name);
  name.trim().to_string()
}

/// A document whose hand-assigned name diverges from its file name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameMismatch {
  pub document_id: u64,
  /// Name assigned in the table.
  pub name:        String,
  /// Name derived from the path via [`clean_path_name`].
  pub path_name:   String,
  pub path:        String,
  pub similarity:  f64,
}

/// Documents whose two names score below `threshold`, worst first.
pub fn find_mismatches(
  documents: &DocumentTable,
  threshold: f64,
) -> Vec<NameMismatch> {
  let mut mismatches: Vec<NameMismatch> = documents
    .iter()
    .filter_map(|doc| {
      let path_name = clean_path_name(&doc.path);
      let similarity = similarity_ratio(&doc.name, &path_name);
      (similarity < threshold).then(|| NameMismatch {
        document_id: doc.id,
        name: doc.name.clone(),
        path_name,
        path: doc.path.clone(),
        similarity,
      })
    })
    .collect();
  // Stable: equal scores keep table encounter order.
  mismatches.sort_by(|a, b| a.similarity.total_cmp(&b.similarity));
  mismatches
}

// ─── Code-set overlaps ───────────────────────────────────────────────────────

/// A pair of documents sharing a significant portion of their codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeOverlap {
  pub first_id:     u64,
  pub second_id:    u64,
  pub shared_count: usize,
  /// Shared distinct codes as a percentage of the smaller code set.
  pub shared_pct:   f64,
  /// The full shared set, sorted lexicographically.
  pub shared_codes: Vec<String>,
}

/// Every unordered pair of referenced documents whose distinct code sets
/// share at least `min_shared` codes and at least `min_pct` percent of the
/// smaller set. Sorted by shared count, largest first.
///
/// Quadratic in the number of referenced documents; fine for diagnostic
/// batch sizes (hundreds). If dumps ever outgrow that, group documents by
/// shared code membership first and only compare groups.
pub fn find_overlaps(
  index: &CodeIndex,
  min_shared: usize,
  min_pct: f64,
) -> Vec<CodeOverlap> {
  let sets: Vec<(u64, HashSet<&str>)> = index
    .by_document()
    .iter()
    .map(|(id, codes)| (*id, codes.iter().copied().collect()))
    .collect();

  let mut overlaps = Vec::new();
  for (pos, (first_id, first_set)) in sets.iter().enumerate() {
    for (second_id, second_set) in &sets[pos + 1..] {
      let shared: Vec<&str> =
        first_set.intersection(second_set).copied().collect();
      if shared.len() < min_shared {
        continue;
      }
      let smaller = first_set.len().min(second_set.len());
      let shared_pct = shared.len() as f64 / smaller as f64 * 100.0;
      if shared_pct < min_pct {
        continue;
      }

      let mut shared_codes: Vec<String> =
        shared.into_iter().map(str::to_string).collect();
      shared_codes.sort_unstable();
      overlaps.push(CodeOverlap {
        first_id: *first_id,
        second_id: *second_id,
        shared_count: shared_codes.len(),
        shared_pct,
        shared_codes,
      });
    }
  }
  // Stable: ties keep pair-generation order.
  overlaps.sort_by(|a, b| b.shared_count.cmp(&a.shared_count));
  overlaps
}

// ─── Duplication ranking ─────────────────────────────────────────────────────

/// A code and the distinct documents referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCode {
  pub code:         String,
  /// In encounter order.
  pub document_ids: Vec<u64>,
}

/// Codes referenced by more than one distinct document, most-referenced
/// first; ties keep first-occurrence order.
pub fn rank_duplicated_codes(index: &CodeIndex) -> Vec<RankedCode> {
  let mut ranked: Vec<RankedCode> = index
    .occurrences()
    .iter()
    .filter(|(_, ids)| ids.len() > 1)
    .map(|(code, ids)| RankedCode {
      code:         (*code).to_string(),
      document_ids: ids.clone(),
    })
    .collect();
  ranked.sort_by(|a, b| b.document_ids.len().cmp(&a.document_ids.len()));
  ranked
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Code, Document, DumpData};

  fn doc(id: u64, name: &str, path: &str) -> Document {
    Document {
      id,
      name: name.to_string(),
      date: "2024-01-01".to_string(),
      path: path.to_string(),
      extracted_codes: None,
    }
  }

  fn table(docs: Vec<Document>) -> DocumentTable {
    let mut table = DocumentTable::new();
    for d in docs {
      table.insert(d).unwrap();
    }
    table
  }

  fn codes_data(rows: &[(u64, &str)]) -> DumpData {
    DumpData {
      documents: Default::default(),
      codes:     rows
        .iter()
        .enumerate()
        .map(|(i, &(document_id, code))| Code {
          id: i as u64 + 1,
          document_id,
          code: code.to_string(),
        })
        .collect(),
    }
  }

  // ── Ratio ────────────────────────────────────────────────────────────────

  #[test]
  fn identical_strings_score_one() {
    assert_eq!(similarity_ratio("Report A", "Report A"), 1.0);
    assert_eq!(similarity_ratio("", ""), 1.0);
  }

  #[test]
  fn ratio_is_case_insensitive() {
    assert_eq!(similarity_ratio("REPORT A", "report a"), 1.0);
  }

  #[test]
  fn ratio_is_symmetric() {
    let pairs = [
      ("Report A", "Totally Different"),
      ("abcd", "bcde"),
      ("Informe mensual", "informe_mensual (2)"),
      ("", "nonempty"),
    ];
    for (a, b) in pairs {
      assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a), "{a} / {b}");
    }
  }

  #[test]
  fn ratio_counts_matching_blocks() {
    // "bcd" matches out of 4 + 4 characters.
    assert_eq!(similarity_ratio("abcd", "bcde"), 0.75);
    assert_eq!(similarity_ratio("", "x"), 0.0);
    assert_eq!(similarity_ratio("xy", "ab"), 0.0);
  }

  // ── Path name cleaning ───────────────────────────────────────────────────

  #[test]
  fn clean_path_name_strips_prefix_and_suffix() {
    assert_eq!(clean_path_name("1748100868_Report A.pdf"), "Report A");
    assert_eq!(clean_path_name("Report B.pdf"), "Report B");
    assert_eq!(clean_path_name("99_plain"), "plain");
    assert_eq!(clean_path_name("notes.txt"), "notes.txt");
  }

  #[test]
  fn clean_path_name_requires_digits_then_underscore() {
    // No digits before the underscore: nothing to strip.
    assert_eq!(clean_path_name("_Report.pdf"), "_Report");
    // Digits not followed by an underscore stay.
    assert_eq!(clean_path_name("42x_Report.pdf"), "42x_Report");
    assert_eq!(clean_path_name("123.pdf"), "123");
  }

  #[test]
  fn clean_path_name_strips_only_a_trailing_pdf() {
    assert_eq!(clean_path_name("10_a.pdf.bak"), "a.pdf.bak");
    assert_eq!(clean_path_name("10_a.pdf.pdf"), "a.pdf");
  }

  // ── Mismatches ───────────────────────────────────────────────────────────

  #[test]
  fn divergent_name_is_flagged_and_matching_name_is_not() {
    let documents = table(vec![
      doc(1, "Report A", "100_Report A.pdf"),
      doc(2, "Report A", "200_Totally Different.pdf"),
    ]);
    let found = find_mismatches(&documents, DEFAULT_SIMILARITY_THRESHOLD);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].document_id, 2);
    assert_eq!(found[0].path_name, "Totally Different");
    assert!(found[0].similarity < DEFAULT_SIMILARITY_THRESHOLD);
  }

  #[test]
  fn mismatches_sort_worst_first() {
    let documents = table(vec![
      doc(1, "Quarterly figures", "10_Quarterly figures (final).pdf"),
      doc(2, "Presupuesto", "20_Unrelated scan.pdf"),
    ]);
    let found = find_mismatches(&documents, 0.95);

    assert_eq!(found.len(), 2);
    assert!(found[0].similarity <= found[1].similarity);
    assert_eq!(found[0].document_id, 2);
  }

  #[test]
  fn threshold_is_exclusive() {
    let documents = table(vec![doc(1, "abcd", "1_bcde.pdf")]);
    // Ratio is exactly 0.75; a threshold of 0.75 must not flag it.
    assert!(find_mismatches(&documents, 0.75).is_empty());
    assert_eq!(find_mismatches(&documents, 0.76).len(), 1);
  }

  // ── Overlaps ─────────────────────────────────────────────────────────────

  #[test]
  fn eleven_shared_codes_qualify() {
    let shared: Vec<String> = (1..=11).map(|n| n.to_string()).collect();
    let mut rows: Vec<(u64, &str)> = Vec::new();
    for code in &shared {
      rows.push((1, code.as_str()));
      rows.push((2, code.as_str()));
    }
    let data = codes_data(&rows);
    let index = CodeIndex::build(&data);

    let overlaps = find_overlaps(
      &index,
      DEFAULT_MIN_SHARED_CODES,
      DEFAULT_MIN_OVERLAP_PCT,
    );
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].shared_count, 11);
    assert_eq!(overlaps[0].shared_pct, 100.0);
    assert_eq!(overlaps[0].first_id, 1);
    assert_eq!(overlaps[0].second_id, 2);
  }

  #[test]
  fn both_thresholds_must_hold() {
    // Nine shared codes fail the count threshold even at 100%.
    let mut rows: Vec<(u64, &str)> = Vec::new();
    let shared: Vec<String> = (1..=9).map(|n| n.to_string()).collect();
    for code in &shared {
      rows.push((1, code.as_str()));
      rows.push((2, code.as_str()));
    }
    let data = codes_data(&rows);
    let index = CodeIndex::build(&data);
    assert!(find_overlaps(&index, 10, 5.0).is_empty());
    assert_eq!(find_overlaps(&index, 9, 5.0).len(), 1);

    // Ten shared codes fail a percentage threshold above their share.
    let shared: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
    let fillers: Vec<String> = (11..=1000).map(|n| n.to_string()).collect();
    let mut rows: Vec<(u64, &str)> = Vec::new();
    for code in &shared {
      rows.push((1, code.as_str()));
      rows.push((2, code.as_str()));
    }
    for filler in &fillers {
      rows.push((1, filler.as_str()));
    }
    // Pad the second document with fillers of its own: it stays the
    // smaller set and only the ten shared codes intersect.
    let second_fillers: Vec<String> =
      (1001..=1490).map(|n| n.to_string()).collect();
    for filler in &second_fillers {
      rows.push((2, filler.as_str()));
    }
    let data = codes_data(&rows);
    let index = CodeIndex::build(&data);
    // Shared share of the smaller set (500 codes) is 2%.
    assert!(find_overlaps(&index, 10, 5.0).is_empty());
    assert_eq!(find_overlaps(&index, 10, 2.0).len(), 1);
  }

  #[test]
  fn duplicate_rows_collapse_into_sets() {
    // Each code listed twice under document 1; the set still has one copy.
    let rows = vec![
      (1, "A"),
      (1, "A"),
      (1, "B"),
      (2, "A"),
      (2, "B"),
    ];
    let data = codes_data(&rows);
    let index = CodeIndex::build(&data);

    let overlaps = find_overlaps(&index, 2, 5.0);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].shared_count, 2);
    assert_eq!(overlaps[0].shared_codes, vec!["A", "B"]);
    assert_eq!(overlaps[0].shared_pct, 100.0);
  }

  #[test]
  fn overlaps_sort_by_shared_count_descending() {
    let mut rows: Vec<(u64, &str)> = Vec::new();
    let pair_small: Vec<String> = (1..=2).map(|n| format!("S{n}")).collect();
    let pair_big: Vec<String> = (1..=4).map(|n| format!("B{n}")).collect();
    for code in &pair_small {
      rows.push((1, code.as_str()));
      rows.push((2, code.as_str()));
    }
    for code in &pair_big {
      rows.push((3, code.as_str()));
      rows.push((4, code.as_str()));
    }
    let data = codes_data(&rows);
    let index = CodeIndex::build(&data);

    let overlaps = find_overlaps(&index, 1, 1.0);
    let counts: Vec<usize> =
      overlaps.iter().map(|o| o.shared_count).collect();
    assert_eq!(counts, vec![4, 2]);
    assert_eq!((overlaps[0].first_id, overlaps[0].second_id), (3, 4));
  }

  // ── Ranking ──────────────────────────────────────────────────────────────

  #[test]
  fn ranking_orders_by_distinct_document_count() {
    let rows = vec![
      (10, "TWICE"),
      (20, "TWICE"),
      (10, "THRICE"),
      (20, "THRICE"),
      (30, "THRICE"),
      (10, "ONCE"),
      // A repeat under one document does not add a reference.
      (10, "TWICE"),
    ];
    let data = codes_data(&rows);
    let index = CodeIndex::build(&data);

    let ranked = rank_duplicated_codes(&index);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].code, "THRICE");
    assert_eq!(ranked[0].document_ids, vec![10, 20, 30]);
    assert_eq!(ranked[1].code, "TWICE");
    assert_eq!(ranked[1].document_ids, vec![10, 20]);
  }
}
