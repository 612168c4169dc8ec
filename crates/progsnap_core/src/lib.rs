//! Progsnap Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! Records decoded from a progsnap dataset are wrapped in typed entities
//! whose accessors fail loudly instead of guessing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod event;
pub mod props;
pub mod time;

// Re-exports
pub use entity::{Assignment, Position, Student, Test};
pub use error::{ProgsnapError, ProgsnapResult};
pub use event::{Compilation, Edit, EditKind, Event, SnapshotId, Submission, TestResults};
pub use props::Props;
pub use time::EpochMillis;
