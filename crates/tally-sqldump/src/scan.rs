//! Low-level cursor over dump text.
//!
//! Scans byte-wise: every structural character of the grammar (quotes,
//! backquotes, parentheses, commas, digits) is ASCII, so byte positions at
//! token boundaries are always valid char boundaries and slices of the
//! source between them stay valid UTF-8.

use crate::error::{Error, Result};

fn is_word_byte(b: u8) -> bool { b.is_ascii_alphanumeric() || b == b'_' }

/// Where a recovery scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recovery {
  /// At a boundary the tuple-list walk can continue from.
  Resumed,
  /// At a word-bounded `INSERT`: the current statement never closed.
  NewStatement,
  /// Input exhausted.
  EndOfInput,
}

pub(crate) struct Scanner<'a> {
  src:  &'a str,
  pos:  usize,
  line: usize,
}

impl<'a> Scanner<'a> {
  pub fn new(src: &'a str) -> Self { Self { src, pos: 0, line: 1 } }

  /// Byte offset of the next unread byte.
  pub fn offset(&self) -> usize { self.pos }

  /// 1-based line of the next unread byte.
  pub fn line(&self) -> usize { self.line }

  pub fn is_at_end(&self) -> bool { self.pos >= self.src.len() }

  pub fn peek(&self) -> Option<u8> {
    self.src.as_bytes().get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<u8> {
    let byte = self.peek()?;
    self.pos += 1;
    if byte == b'\n' {
      self.line += 1;
    }
    Some(byte)
  }

  /// Advance over one full character. Multi-byte characters contain no
  /// ASCII bytes, so byte-wise line tracking stays correct.
  fn bump_char(&mut self) {
    let len = self.src[self.pos..]
      .chars()
      .next()
      .map_or(0, char::len_utf8);
    for _ in 0..len {
      self.bump();
    }
  }

  pub fn skip_whitespace(&mut self) {
    while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
      self.bump();
    }
  }

  pub fn eat(&mut self, expected: u8) -> bool {
    if self.peek() == Some(expected) {
      self.bump();
      return true;
    }
    false
  }

  pub fn expect(&mut self, expected: u8, what: &'static str) -> Result<()> {
    if self.eat(expected) {
      Ok(())
    } else {
      Err(Error::Unexpected {
        line:     self.line,
        expected: what,
        found:    self.describe_next(),
      })
    }
  }

  /// The next character, quoted for an error message.
  pub fn describe_next(&self) -> String {
    match self.src[self.pos..].chars().next() {
      Some(c) => format!("{c:?}"),
      None => "end of input".to_string(),
    }
  }

  /// The cursor sits where a new statement begins: at a word-bounded
  /// `INSERT` keyword.
  fn at_statement_start(&self) -> bool {
    let bytes = self.src.as_bytes();
    (self.pos == 0 || !is_word_byte(bytes[self.pos - 1]))
      && self.at_keyword("INSERT")
  }

  /// Advance past the next word-bounded `INSERT`, case-insensitively.
  /// Returns false when the input is exhausted first.
  pub fn seek_insert(&mut self) -> bool {
    while !self.is_at_end() {
      if self.at_statement_start() && self.eat_keyword("INSERT") {
        return true;
      }
      if self.peek().is_some_and(is_word_byte) {
        // Consume the whole word so the keyword never matches inside one.
        while self.peek().is_some_and(is_word_byte) {
          self.bump();
        }
      } else {
        self.bump();
      }
    }
    false
  }

  /// `word` is present at the cursor, case-insensitively and followed by a
  /// word boundary. Does not consume.
  fn at_keyword(&self, word: &str) -> bool {
    let bytes = self.src.as_bytes();
    let end = self.pos + word.len();
    if end > bytes.len()
      || !bytes[self.pos..end].eq_ignore_ascii_case(word.as_bytes())
    {
      return false;
    }
    !bytes.get(end).copied().is_some_and(is_word_byte)
  }

  /// Consume `word` if it is present here, case-insensitively and followed
  /// by a word boundary.
  pub fn eat_keyword(&mut self, word: &str) -> bool {
    if !self.at_keyword(word) {
      return false;
    }
    for _ in 0..word.len() {
      self.bump();
    }
    true
  }

  /// A backquoted or bare identifier.
  pub fn identifier(&mut self) -> Result<&'a str> {
    if self.eat(b'`') {
      let start = self.pos;
      while let Some(b) = self.peek() {
        if b == b'`' {
          let name = &self.src[start..self.pos];
          self.bump();
          return Ok(name);
        }
        self.bump();
      }
      return Err(Error::Unexpected {
        line:     self.line,
        expected: "closing '`'",
        found:    "end of input".to_string(),
      });
    }

    let start = self.pos;
    while self.peek().is_some_and(is_word_byte) {
      self.bump();
    }
    if self.pos == start {
      return Err(Error::Unexpected {
        line:     self.line,
        expected: "identifier",
        found:    self.describe_next(),
      });
    }
    Ok(&self.src[start..self.pos])
  }

  /// A bare unsigned decimal integer.
  pub fn unsigned(&mut self) -> Result<u64> {
    let start = self.pos;
    let line = self.line;
    while self.peek().is_some_and(|b| b.is_ascii_digit()) {
      self.bump();
    }
    if self.pos == start {
      return Err(Error::Unexpected {
        line,
        expected: "integer",
        found: self.describe_next(),
      });
    }
    let text = &self.src[start..self.pos];
    text
      .parse()
      .map_err(|_| Error::IntegerOutOfRange { line, text: text.to_string() })
  }

  /// A single-quoted string literal. Handles `''` doubling and backslash
  /// escapes the way MySQL dumps emit them; an unknown escaped character
  /// stands for itself.
  pub fn string_literal(&mut self) -> Result<String> {
    let open_line = self.line;
    self.expect(b'\'', "string literal")?;

    let mut value = String::new();
    let mut run_start = self.pos;
    loop {
      match self.peek() {
        None => return Err(Error::UnterminatedString { line: open_line }),
        Some(b'\'') => {
          value.push_str(&self.src[run_start..self.pos]);
          self.bump();
          if self.eat(b'\'') {
            value.push('\'');
            run_start = self.pos;
          } else {
            return Ok(value);
          }
        }
        Some(b'\\') => {
          value.push_str(&self.src[run_start..self.pos]);
          self.bump();
          let mapped = match self.peek() {
            None => {
              return Err(Error::UnterminatedString { line: open_line });
            }
            Some(b'n') => Some('\n'),
            Some(b't') => Some('\t'),
            Some(b'r') => Some('\r'),
            Some(b'0') => Some('\0'),
            Some(_) => None,
          };
          match mapped {
            Some(c) => {
              value.push(c);
              self.bump();
              run_start = self.pos;
            }
            // '\'', '"', '\\' and all others: the character itself.
            None => {
              run_start = self.pos;
              self.bump_char();
            }
          }
        }
        Some(_) => {
          self.bump();
        }
      }
    }
  }

  /// Skip the remainder of a parenthesized tuple the cursor is inside of,
  /// past the matching `)`. Quoted strings are honored so a `)` inside a
  /// value cannot end the skip early. Used to recover after a tuple error.
  ///
  /// The input here already failed to parse once, so the quote state is a
  /// guess: the scan refuses to cross into the next statement, stopping
  /// before a `;` outside a string and anywhere a word-bounded `INSERT`
  /// begins.
  pub fn skip_balanced(&mut self) -> Recovery {
    let mut depth = 1usize;
    let mut in_string = false;
    while let Some(b) = self.peek() {
      if self.at_statement_start() {
        return Recovery::NewStatement;
      }
      if !in_string && b == b';' {
        return Recovery::Resumed;
      }
      self.bump();
      if in_string {
        match b {
          b'\\' => {
            self.bump();
          }
          b'\'' => in_string = false,
          _ => {}
        }
        continue;
      }
      match b {
        b'(' => depth += 1,
        b')' => {
          depth -= 1;
          if depth == 0 {
            return Recovery::Resumed;
          }
        }
        b'\'' => in_string = true,
        _ => {}
      }
    }
    Recovery::EndOfInput
  }

  /// Advance to something that can continue a tuple list: stop right
  /// before a `(` or a `;`, or consume a `,` and stop. Quoted strings and
  /// statement starts bound the scan exactly as in `skip_balanced`.
  pub fn resync_tuple_list(&mut self) -> Recovery {
    let mut in_string = false;
    while let Some(b) = self.peek() {
      if self.at_statement_start() {
        return Recovery::NewStatement;
      }
      if in_string {
        self.bump();
        match b {
          b'\\' => {
            self.bump();
          }
          b'\'' => in_string = false,
          _ => {}
        }
        continue;
      }
      match b {
        b'(' | b';' => return Recovery::Resumed,
        b',' => {
          self.bump();
          return Recovery::Resumed;
        }
        b'\'' => {
          self.bump();
          in_string = true;
        }
        _ => {
          self.bump();
        }
      }
    }
    Recovery::EndOfInput
  }

  /// Up to `max_chars` of source starting at `offset`, whitespace flattened
  /// to single spaces.
  pub fn snippet_from(&self, offset: usize, max_chars: usize) -> String {
    self.src[offset..]
      .chars()
      .take(max_chars)
      .map(|c| if c.is_whitespace() { ' ' } else { c })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scanner(src: &str) -> Scanner<'_> { Scanner::new(src) }

  #[test]
  fn seek_insert_is_case_insensitive_and_word_bounded() {
    let mut s = scanner("REINSERT insertion\ninsert into");
    assert!(s.seek_insert());
    // Skipped both false positives; landed after the real keyword.
    assert_eq!(s.line(), 2);
    s.skip_whitespace();
    assert!(s.eat_keyword("INTO"));
  }

  #[test]
  fn seek_insert_reports_exhaustion() {
    let mut s = scanner("CREATE TABLE x (y INT);");
    assert!(!s.seek_insert());
    assert!(s.is_at_end());
  }

  #[test]
  fn identifiers_allow_backquotes() {
    let mut s = scanner("`documents`");
    assert_eq!(s.identifier().unwrap(), "documents");

    let mut s = scanner("codes (");
    assert_eq!(s.identifier().unwrap(), "codes");

    let mut s = scanner("`unclosed");
    assert!(matches!(s.identifier(), Err(Error::Unexpected { .. })));
  }

  #[test]
  fn unsigned_parses_and_rejects() {
    let mut s = scanner("12345,");
    assert_eq!(s.unsigned().unwrap(), 12345);

    let mut s = scanner("x");
    assert!(matches!(s.unsigned(), Err(Error::Unexpected { .. })));

    let mut s = scanner("99999999999999999999999999");
    assert!(matches!(s.unsigned(), Err(Error::IntegerOutOfRange { .. })));
  }

  #[test]
  fn string_literal_handles_doubling_and_escapes() {
    let mut s = scanner("'plain'");
    assert_eq!(s.string_literal().unwrap(), "plain");

    let mut s = scanner("'it''s'");
    assert_eq!(s.string_literal().unwrap(), "it's");

    let mut s = scanner(r"'a\'b\\c\nd'");
    assert_eq!(s.string_literal().unwrap(), "a'b\\c\nd");

    // Unknown escape: the character itself.
    let mut s = scanner(r"'x\%y'");
    assert_eq!(s.string_literal().unwrap(), "x%y");

    let mut s = scanner("'dañado'");
    assert_eq!(s.string_literal().unwrap(), "dañado");
  }

  #[test]
  fn unterminated_string_reports_opening_line() {
    let mut s = scanner("\n\n'never ends");
    s.skip_whitespace();
    let err = s.string_literal().unwrap_err();
    assert_eq!(err, Error::UnterminatedString { line: 3 });
  }

  #[test]
  fn skip_balanced_honors_nesting_and_strings() {
    // Cursor is inside a tuple: one close paren is already owed.
    let mut s = scanner("1, '(not a close)', (2)) next");
    assert_eq!(s.skip_balanced(), Recovery::Resumed);
    s.skip_whitespace();
    assert!(s.eat_keyword("next"));
  }

  #[test]
  fn resync_honors_quoted_strings() {
    // The ',' and '(' inside the literal are data, not boundaries.
    let mut s = scanner("junk 'x,(' ; tail");
    assert_eq!(s.resync_tuple_list(), Recovery::Resumed);
    assert!(s.eat(b';'));
  }

  #[test]
  fn recovery_stops_where_a_new_statement_begins() {
    // The quote never closes; the scan must still end at the INSERT.
    let mut s = scanner("1, 'unterminated);\nINSERT INTO x");
    assert_eq!(s.skip_balanced(), Recovery::NewStatement);
    assert!(s.eat_keyword("INSERT"));

    let mut s = scanner("garbage 'no close\nINSERT INTO x");
    assert_eq!(s.resync_tuple_list(), Recovery::NewStatement);
    assert_eq!(s.line(), 2);
  }

  #[test]
  fn line_tracking_counts_newlines() {
    let mut s = scanner("1,\n2,\n3) rest");
    assert_eq!(s.line(), 1);
    s.skip_balanced();
    assert_eq!(s.line(), 3);
  }
}
