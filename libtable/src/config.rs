//! Table engine configuration.
//!
//! Read from `table.toml` in the user data directory, else the shared data
//! directory, else defaults:
//!
//! ```toml
//! select_keys = "1234567890"
//! page_size = 5
//! max_candidates = 100
//! completion = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};

pub const CONFIG_FILE_NAME: &str = "table.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    /// Keys for picking candidates on the current page, in order.
    pub select_keys: String,
    pub page_size: usize,
    /// Upper bound on candidates gathered per lookup.
    pub max_candidates: usize,
    /// Offer entries whose code merely starts with the input.
    pub completion: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            select_keys: "1234567890".to_string(),
            page_size: 5,
            max_candidates: 100,
            completion: true,
        }
    }
}

impl TableConfig {
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: TableConfig =
            toml::from_str(&content).map_err(|source| TableError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        config.normalize();
        Ok(config)
    }

    /// First `table.toml` found in `dirs`, or defaults.
    pub fn discover<P: AsRef<Path>>(dirs: &[P]) -> Result<Self> {
        for dir in dirs {
            let path = dir.as_ref().join(CONFIG_FILE_NAME);
            if path.is_file() {
                return Self::load_toml(path);
            }
        }
        Ok(Self::default())
    }

    fn normalize(&mut self) {
        if self.select_keys.is_empty() {
            self.select_keys = Self::default().select_keys;
        }
        self.page_size = self.page_size.max(1);
        self.max_candidates = self.max_candidates.max(1);
    }

    /// Position of `ch` among the select keys, limited to one page.
    pub fn selection_key_index(&self, ch: char) -> Option<usize> {
        self.select_keys
            .chars()
            .take(self.page_size)
            .position(|c| c == ch)
    }
}
