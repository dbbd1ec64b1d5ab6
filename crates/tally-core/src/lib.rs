//! Core types and analysis passes for the tally dump analyzer.
//!
//! This crate is deliberately free of I/O and CLI dependencies. It consumes
//! already-parsed records (produced by `tally-sqldump`) and computes plain
//! report structs; `tally-cli` renders those.

pub mod error;
pub mod index;
pub mod integrity;
pub mod record;
pub mod similarity;

pub use error::{Error, Result};
