//! Refnav: reference navigation for YAML-serialized asset projects.
//!
//! This library finds every file that references a target asset, resolving
//! component-level sub-references inside scenes and prefabs, and tallies how
//! often every asset is referenced across the project. Long scans run as
//! resumable sessions that the caller steps one file at a time.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod history;
pub mod model;
pub mod progress;
pub mod resolve;
pub mod scan;
pub mod session;
pub mod symbols;
pub mod tally;

/// Re-export common error types for convenience.
pub use error::{RefNavError, Result};

/// Re-export the catalog seam for convenience.
pub use catalog::{AssetCatalog, MemoryCatalog, ProjectCatalog};

/// Re-export session types for convenience.
pub use session::{ScanSession, SessionOptions, SessionState};

/// Refnav version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
