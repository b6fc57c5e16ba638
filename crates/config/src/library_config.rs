//! Library configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the catalog and the audio files live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Mirror that replaces the catalog's own root; track sources hang off it
    pub root_url: Option<String>,

    /// Local catalog document. `None` means the embedding app supplies it
    pub catalog_path: Option<PathBuf>,

    /// File backing the key-value store (relative to config dir if not absolute)
    pub store_path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root_url: None,
            catalog_path: None,
            store_path: PathBuf::from("store.json"),
        }
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Vec::new();

        if let Some(ref url) = self.root_url {
            results.push(Validator::http_url(url, "library.root_url"));
        }

        if self.store_path.as_os_str().is_empty() {
            results.push(Err(ValidationError::new(
                "library.store_path",
                "must not be empty",
            )));
        }

        if let Some(ref catalog) = self.catalog_path {
            // Existence is checked when the catalog is read, not here
            if catalog.as_os_str().is_empty() {
                results.push(Err(ValidationError::new(
                    "library.catalog_path",
                    "must not be empty when set",
                )));
            }
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.root_url = other.root_url;
        self.catalog_path = other.catalog_path;
        self.store_path = other.store_path;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}
