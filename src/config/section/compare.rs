//! `[compare]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compare]
//! storage = ".vitrine/storage.json"   # relative to the config file
//! max_items = 3
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Product comparison settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// File backing the local key-value storage.
    pub storage: PathBuf,

    /// Capacity of the comparison list.
    pub max_items: usize,
}

impl CompareConfig {
    const STORAGE: FieldPath = FieldPath::new("compare.storage");
    const MAX_ITEMS: FieldPath = FieldPath::new("compare.max_items");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.storage.as_os_str().is_empty() {
            diag.error(Self::STORAGE, "must not be empty");
        }
        if self.max_items == 0 {
            diag.error(Self::MAX_ITEMS, "must be at least 1");
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            storage: PathBuf::from(".vitrine/storage.json"),
            max_items: 3,
        }
    }
}
