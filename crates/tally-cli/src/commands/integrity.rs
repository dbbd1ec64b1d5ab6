//! `tally integrity` — referential integrity and duplication report.

use std::path::Path;

use anyhow::Result;
use tally_core::{index::CodeIndex, integrity};

use crate::{config::Settings, output, render};

pub fn run(dump: &Path, settings: Settings, json: bool) -> Result<()> {
  let parsed = super::load_dump(dump)?;
  let index = CodeIndex::build(&parsed.data);
  let report = integrity::analyze(&parsed.data, &index);

  if json {
    output::print_envelope(dump, "integrity", &parsed.report, &report)?;
  } else {
    let mut text =
      render::integrity(&report, &parsed.data.documents, &settings);
    text.push_str(&render::parser_warnings(&parsed.report, &settings));
    print!("{text}");
  }
  Ok(())
}
