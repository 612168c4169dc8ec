//! Progsnap Tagged-Record Log
//!
//! Every progsnap data file is newline-delimited JSON, one
//! `{"tag": ..., "value": ...}` object per line. This crate parses those
//! lines and routes each record to a callback chosen by its tag.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handler;
pub mod record;
pub mod scanner;

pub use handler::{TagCallback, TagHandler, UNKNOWN_TAG};
pub use record::Record;
pub use scanner::{ScanSummary, scan};
