//! Machine-readable output.
//!
//! Every `--json` invocation prints one envelope: where the data came
//! from, when the report was generated, what the parser had to work
//! around, and the command-specific payload.

use std::{io, path::Path};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_sqldump::ParseReport;

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
  dump:         String,
  generated_at: DateTime<Utc>,
  command:      &'a str,
  parse:        &'a ParseReport,
  report:       &'a T,
}

pub fn print_envelope<T: Serialize>(
  dump: &Path,
  command: &str,
  parse: &ParseReport,
  report: &T,
) -> Result<()> {
  let envelope = Envelope {
    dump: dump.display().to_string(),
    generated_at: Utc::now(),
    command,
    parse,
    report,
  };
  serde_json::to_writer_pretty(io::stdout().lock(), &envelope)?;
  println!();
  Ok(())
}
