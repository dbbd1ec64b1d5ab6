//! Recursive-descent extraction of `documents` and `codes` INSERT blocks.
//!
//! One pass over the input: find the next word-bounded `INSERT`, try to
//! match a full header, then walk the VALUES tuple list. Only the first
//! `documents` block is ingested; every `codes` block is. Well-formed
//! INSERTs for other tables are walked and discarded so their contents can
//! never be mistaken for records.

use std::vec;

use tally_core::record::{Code, Document, DumpData};

use crate::{
  ParseReport, ParsedDump, SkippedTuple, TableKind,
  error::{Error, Result},
  scan::{Recovery, Scanner},
};

const DOCUMENT_COLUMNS: [&str; 5] =
  ["id", "name", "date", "path", "extracted_codes"];
const CODE_COLUMNS: [&str; 3] = ["id", "document_id", "code"];

/// Source characters kept in a skip-report snippet.
const SNIPPET_CHARS: usize = 60;

enum Header {
  Documents,
  Codes,
  /// A well-formed INSERT for some other table or column set.
  Foreign,
}

/// A literal tuple as it appears in the dump, before column typing.
#[derive(Debug)]
enum Literal {
  Int(u64),
  Str(String),
  Null,
}

struct RawTuple {
  line:   usize,
  offset: usize,
  values: Vec<Literal>,
}

struct TupleError {
  line:   usize,
  offset: usize,
  error:  Error,
}

// ─── Top level ───────────────────────────────────────────────────────────────

pub(crate) fn parse_dump(text: &str) -> ParsedDump {
  let mut data = DumpData::default();
  let mut report = ParseReport::default();
  let mut scanner = Scanner::new(text);

  while scanner.seek_insert() {
    let Some(header) = parse_header(&mut scanner) else {
      continue;
    };
    match header {
      Header::Documents => {
        report.document_blocks += 1;
        if report.document_blocks > 1 {
          // Single contiguous block: later blocks are counted, not read.
          let _ = parse_tuple_list(&mut scanner);
          continue;
        }
        for item in parse_tuple_list(&mut scanner) {
          match item {
            Ok(tuple) => {
              let (line, offset) = (tuple.line, tuple.offset);
              match build_document(tuple) {
                Ok(document) => {
                  if let Err(tally_core::Error::DuplicateDocumentId(id)) =
                    data.documents.insert(document)
                  {
                    report.duplicate_document_ids.push(id);
                  }
                }
                Err(error) => push_skip(
                  &mut report,
                  &scanner,
                  TableKind::Documents,
                  line,
                  offset,
                  error,
                ),
              }
            }
            Err(e) => push_skip(
              &mut report,
              &scanner,
              TableKind::Documents,
              e.line,
              e.offset,
              e.error,
            ),
          }
        }
      }
      Header::Codes => {
        report.code_blocks += 1;
        for item in parse_tuple_list(&mut scanner) {
          match item {
            Ok(tuple) => {
              let (line, offset) = (tuple.line, tuple.offset);
              match build_code(tuple) {
                Ok(code) => data.codes.push(code),
                Err(error) => push_skip(
                  &mut report,
                  &scanner,
                  TableKind::Codes,
                  line,
                  offset,
                  error,
                ),
              }
            }
            Err(e) => push_skip(
              &mut report,
              &scanner,
              TableKind::Codes,
              e.line,
              e.offset,
              e.error,
            ),
          }
        }
      }
      Header::Foreign => {
        let _ = parse_tuple_list(&mut scanner);
      }
    }
  }

  ParsedDump { data, report }
}

fn push_skip(
  report: &mut ParseReport,
  scanner: &Scanner,
  table: TableKind,
  line: usize,
  offset: usize,
  error: Error,
) {
  report.skipped.push(SkippedTuple {
    table,
    line,
    reason: error.to_string(),
    snippet: scanner.snippet_from(offset, SNIPPET_CHARS),
  });
}

// ─── Statement header ────────────────────────────────────────────────────────

/// Match the rest of `INSERT INTO <table> (<columns>) VALUES`; the INSERT
/// keyword itself is already consumed. None means the text was not a
/// well-formed header; scanning resumes wherever the mismatch was found.
fn parse_header(scanner: &mut Scanner) -> Option<Header> {
  scanner.skip_whitespace();
  if !scanner.eat_keyword("INTO") {
    return None;
  }
  scanner.skip_whitespace();
  let table = scanner.identifier().ok()?;
  scanner.skip_whitespace();
  if !scanner.eat(b'(') {
    return None;
  }

  let mut columns: Vec<&str> = Vec::new();
  loop {
    scanner.skip_whitespace();
    columns.push(scanner.identifier().ok()?);
    scanner.skip_whitespace();
    if scanner.eat(b',') {
      continue;
    }
    if scanner.eat(b')') {
      break;
    }
    return None;
  }

  scanner.skip_whitespace();
  if !scanner.eat_keyword("VALUES") {
    return None;
  }

  if table == "documents" && columns == DOCUMENT_COLUMNS {
    Some(Header::Documents)
  } else if table == "codes" && columns == CODE_COLUMNS {
    Some(Header::Codes)
  } else {
    Some(Header::Foreign)
  }
}

// ─── Tuple list ──────────────────────────────────────────────────────────────

/// Walk the tuple list following VALUES up to the statement delimiter (or
/// end of input, which is tolerated). Malformed tuples come back as errors
/// with the scanner recovered at the next tuple boundary, so one bad row
/// never takes the rest of the block with it. When recovery runs into the
/// next statement instead of a boundary, the rest of this list comes back
/// as one more error and the walk ends, leaving the scanner on the new
/// statement.
fn parse_tuple_list(
  scanner: &mut Scanner,
) -> Vec<Result<RawTuple, TupleError>> {
  let mut items = Vec::new();
  loop {
    scanner.skip_whitespace();
    if scanner.is_at_end() || scanner.eat(b';') {
      break;
    }
    if scanner.eat(b',') {
      continue;
    }

    let line = scanner.line();
    let offset = scanner.offset();
    if !scanner.eat(b'(') {
      items.push(Err(TupleError {
        line,
        offset,
        error: Error::Unexpected {
          line,
          expected: "'(', ',' or ';'",
          found: scanner.describe_next(),
        },
      }));
      match scanner.resync_tuple_list() {
        Recovery::Resumed => continue,
        Recovery::NewStatement => {
          if scanner.offset() > offset {
            items.push(Err(TupleError {
              line,
              offset,
              error: Error::AbandonedTail { line },
            }));
          }
          break;
        }
        Recovery::EndOfInput => break,
      }
    }

    match parse_tuple(scanner) {
      Ok(values) => items.push(Ok(RawTuple { line, offset, values })),
      Err(error) => {
        items.push(Err(TupleError { line, offset, error }));
        let tail_line = scanner.line();
        let tail_offset = scanner.offset();
        match scanner.skip_balanced() {
          Recovery::NewStatement => {
            if scanner.offset() > tail_offset {
              items.push(Err(TupleError {
                line:   tail_line,
                offset: tail_offset,
                error:  Error::AbandonedTail { line: tail_line },
              }));
            }
            break;
          }
          Recovery::Resumed | Recovery::EndOfInput => {}
        }
      }
    }
  }
  items
}

/// The opening '(' is already consumed.
fn parse_tuple(scanner: &mut Scanner) -> Result<Vec<Literal>> {
  let mut values = Vec::new();
  loop {
    scanner.skip_whitespace();
    values.push(parse_literal(scanner)?);
    scanner.skip_whitespace();
    if scanner.eat(b',') {
      continue;
    }
    scanner.expect(b')', "',' or ')'")?;
    return Ok(values);
  }
}

fn parse_literal(scanner: &mut Scanner) -> Result<Literal> {
  match scanner.peek() {
    Some(b'\'') => Ok(Literal::Str(scanner.string_literal()?)),
    Some(b) if b.is_ascii_digit() => Ok(Literal::Int(scanner.unsigned()?)),
    _ => {
      if scanner.eat_keyword("NULL") {
        Ok(Literal::Null)
      } else {
        Err(Error::Unexpected {
          line:     scanner.line(),
          expected: "integer, string or NULL",
          found:    scanner.describe_next(),
        })
      }
    }
  }
}

// ─── Column typing ───────────────────────────────────────────────────────────

fn build_document(tuple: RawTuple) -> Result<Document> {
  let RawTuple { line, values, .. } = tuple;
  check_arity(line, TableKind::Documents, DOCUMENT_COLUMNS.len(), &values)?;
  let mut values = values.into_iter();
  Ok(Document {
    id:              int_column(&mut values, line, TableKind::Documents, "id")?,
    name:            str_column(&mut values, line, TableKind::Documents, "name")?,
    date:            str_column(&mut values, line, TableKind::Documents, "date")?,
    path:            str_column(&mut values, line, TableKind::Documents, "path")?,
    extracted_codes: nullable_str_column(
      &mut values,
      line,
      TableKind::Documents,
      "extracted_codes",
    )?,
  })
}

fn build_code(tuple: RawTuple) -> Result<Code> {
  let RawTuple { line, values, .. } = tuple;
  check_arity(line, TableKind::Codes, CODE_COLUMNS.len(), &values)?;
  let mut values = values.into_iter();
  Ok(Code {
    id:          int_column(&mut values, line, TableKind::Codes, "id")?,
    document_id: int_column(&mut values, line, TableKind::Codes, "document_id")?,
    code:        str_column(&mut values, line, TableKind::Codes, "code")?,
  })
}

fn check_arity(
  line: usize,
  table: TableKind,
  expected: usize,
  values: &[Literal],
) -> Result<()> {
  if values.len() == expected {
    Ok(())
  } else {
    Err(Error::WrongArity { line, table, expected, found: values.len() })
  }
}

fn int_column(
  values: &mut vec::IntoIter<Literal>,
  line: usize,
  table: TableKind,
  column: &'static str,
) -> Result<u64> {
  match values.next() {
    Some(Literal::Int(value)) => Ok(value),
    _ => Err(Error::ColumnType { line, table, column, expected: "an integer" }),
  }
}

fn str_column(
  values: &mut vec::IntoIter<Literal>,
  line: usize,
  table: TableKind,
  column: &'static str,
) -> Result<String> {
  match values.next() {
    Some(Literal::Str(value)) => Ok(value),
    _ => Err(Error::ColumnType { line, table, column, expected: "a string" }),
  }
}

fn nullable_str_column(
  values: &mut vec::IntoIter<Literal>,
  line: usize,
  table: TableKind,
  column: &'static str,
) -> Result<Option<String>> {
  match values.next() {
    Some(Literal::Str(value)) => Ok(Some(value)),
    Some(Literal::Null) => Ok(None),
    _ => {
      Err(Error::ColumnType { line, table, column, expected: "a string or NULL" })
    }
  }
}
