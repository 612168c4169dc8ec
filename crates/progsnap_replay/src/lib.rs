//! Progsnap Replay
//!
//! Reconstructs source text from a work history by applying its edits to a
//! text document, and checks the result against the fulltext snapshots
//! logged alongside the edits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod applicator;
pub mod document;
pub mod engine;
pub mod sync;

pub use applicator::EditApplicator;
pub use document::TextDocument;
pub use engine::{ReplayConfig, ReplayEngine, ReplayOutcome, ReplayStep};
pub use sync::{SyncChecker, texts_match};
