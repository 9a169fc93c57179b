//! Persisted progress scale.
//!
//! The only state kept between runs: the total reference count of the last
//! completed tally, used to size progress output of the next one. Losing or
//! corrupting it never affects results.

use crate::error::{RefNavError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of the progress state file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMemo {
    /// Sum of all counts of the previous tally.
    pub previous_total: u64,
}

impl ProgressMemo {
    /// Memo for a tally with `total` references.
    pub fn new(total: u64) -> Self {
        Self {
            previous_total: total,
        }
    }

    /// Load the memo, falling back to an empty one when the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(memo) => memo,
            Err(e) => {
                log::debug!("No usable progress memo at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load the memo from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| RefNavError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save the memo to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RefNavError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| RefNavError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Fraction of the previous total reached by `current`, clamped to 1.
    /// `None` without a previous total.
    pub fn fraction(&self, current: u64) -> Option<f64> {
        if self.previous_total == 0 {
            return None;
        }
        Some((current as f64 / self.previous_total as f64).min(1.0))
    }
}
