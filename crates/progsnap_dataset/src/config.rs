//! Dataset loading configuration.

use serde::{Deserialize, Serialize};

/// Options fixed when a dataset is opened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Reorder each work history by editid/timestamp after loading,
    /// instead of keeping file order
    pub sort_work_history: bool,
}

impl DatasetConfig {
    /// Set whether work histories are sorted after loading
    #[must_use]
    pub fn with_sort_work_history(mut self, sort: bool) -> Self {
        self.sort_work_history = sort;
        self
    }
}
