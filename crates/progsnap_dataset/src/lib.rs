//! Progsnap Dataset
//!
//! Loads a progsnap dataset from a directory or zip archive, indexes its
//! assignments, students, and work histories by number, and reads each
//! work history's events on demand.
//!
//! ```no_run
//! use progsnap_dataset::{Dataset, DatasetConfig};
//! use std::path::Path;
//!
//! let dataset = Dataset::open(Path::new("cs101.zip"), DatasetConfig::default())?;
//! for student in dataset.students() {
//!     for history in dataset.work_histories_for_student(student.number()) {
//!         println!("{} events", history.events()?.len());
//!     }
//! }
//! # Ok::<(), progsnap_core::ProgsnapError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assignment;
pub mod config;
pub mod dataset;
pub mod history;
pub mod order;

pub use assignment::load_assignment;
pub use config::DatasetConfig;
pub use dataset::{Dataset, DatasetInfo};
pub use history::WorkHistory;
pub use order::{OrderKey, order_key, sort_events};
