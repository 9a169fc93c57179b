//! Refnav error types.
//!
//! Fatal errors are typed through [`RefNavError`]. The per-file failure kinds
//! ([`ScanAnomaly`], [`IoSkip`], [`ResolutionError`],
//! [`ExternalServiceUnavailable`]) are recorded on a session and never abort
//! a corpus-wide scan.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for refnav operations.
#[derive(Error, Debug)]
pub enum RefNavError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The category filter selects nothing or names an unknown category.
    #[error("Invalid category filter: {0}")]
    InvalidCategoryFilter(String),

    /// The search target does not exist in the catalog.
    #[error("Invalid search target: {0}")]
    InvalidTarget(String),

    /// Configuration file could not be read or parsed.
    #[error("Invalid configuration in {path}: {message}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// Parse or validation message.
        message: String,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl RefNavError {
    /// Stable identifier for the error kind, used in JSON payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            RefNavError::Io { .. } => "Io",
            RefNavError::InvalidCategoryFilter(_) => "InvalidCategoryFilter",
            RefNavError::InvalidTarget(_) => "InvalidTarget",
            RefNavError::Config { .. } => "Config",
            RefNavError::Json(_) => "Json",
            RefNavError::Other(_) => "Other",
        }
    }

    /// File associated with the error, when there is one.
    pub fn file_path(&self) -> Option<&std::path::Path> {
        match self {
            RefNavError::Io { path, .. } | RefNavError::Config { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Remediation hint for the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            RefNavError::InvalidCategoryFilter(_) => {
                Some("Use a comma-separated list of: scene, prefab, script, asset, material, files")
            }
            RefNavError::InvalidTarget(_) => {
                Some("Pass an asset path relative to the project root, e.g. Assets/Player.prefab")
            }
            _ => None,
        }
    }
}

/// The search target could not be mapped to a corpus identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolutionError {
    /// The catalog has no global identifier for the target.
    #[error("No global identifier for '{target}'")]
    MissingIdentifier {
        /// Display form of the target.
        target: String,
    },
}

/// Non-fatal oddity found while scanning a file.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScanAnomaly {
    /// The same field name appears twice in one document. The later value wins.
    #[error("Duplicate field '{field}' in document &{local_id} (line {line})")]
    DuplicateField {
        /// Document that holds the duplicate.
        local_id: String,
        /// Field name.
        field: String,
        /// 1-based line of the second occurrence.
        line: usize,
    },
}

/// Reason a corpus file was excluded from a scan.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IoSkip {
    /// File exceeds the configured size limit and was not read.
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        /// Skipped file.
        path: PathBuf,
        /// File size in bytes.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// File could not be read as text.
    #[error("{path} could not be read: {reason}")]
    UnreadableFile {
        /// Skipped file.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },
}

impl IoSkip {
    /// Path of the skipped file.
    pub fn path(&self) -> &std::path::Path {
        match self {
            IoSkip::FileTooLarge { path, .. } | IoSkip::UnreadableFile { path, .. } => path,
        }
    }
}

/// The code-symbol search service failed or is not configured.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Code symbol search unavailable: {reason}")]
pub struct ExternalServiceUnavailable {
    /// Why the service could not answer.
    pub reason: String,
}

impl ExternalServiceUnavailable {
    /// Build from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Result type alias for refnav operations.
pub type Result<T> = std::result::Result<T, RefNavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_hint() {
        let err = RefNavError::InvalidCategoryFilter("bogus".to_string());
        assert_eq!(err.kind(), "InvalidCategoryFilter");
        assert!(err.hint().is_some());
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_config_error_carries_its_file() {
        let err = RefNavError::Config {
            path: PathBuf::from("refnav.toml"),
            message: "capacity must be at least 1".to_string(),
        };
        assert_eq!(err.kind(), "Config");
        assert_eq!(err.file_path(), Some(std::path::Path::new("refnav.toml")));
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_resolution_error_message() {
        let err = ResolutionError::MissingIdentifier {
            target: "Assets/A.prefab".to_string(),
        };
        assert_eq!(err.to_string(), "No global identifier for 'Assets/A.prefab'");
    }

    #[test]
    fn test_io_skip_path() {
        let skip = IoSkip::FileTooLarge {
            path: PathBuf::from("Assets/big.png"),
            size: 50,
            limit: 10,
        };
        assert_eq!(skip.path(), std::path::Path::new("Assets/big.png"));
        assert!(skip.to_string().contains("over the 10 byte limit"));
    }
}
