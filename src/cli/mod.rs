//! Command-line interface for refnav.
//!
//! Argument parsing and output payloads only. Commands are executed by the
//! binary through the library API.

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Reference navigator: find every referrer of an asset, or tally references
/// across the whole project.
#[derive(Parser, Debug)]
#[command(name = "refnav")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available refnav commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Find every asset that references a target.
    Find {
        /// Project root directory.
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Target asset path, relative to the project root.
        #[arg(short, long, required_unless_present = "guid", conflicts_with = "guid")]
        asset: Option<PathBuf>,

        /// Target global identifier.
        #[arg(long)]
        guid: Option<String>,

        /// Categories to search (scene, prefab, script, asset, material, files).
        #[arg(short, long, value_delimiter = ',')]
        category: Vec<String>,

        /// Skip files of this many bytes or more.
        #[arg(long, value_name = "BYTES")]
        size_limit: Option<u64>,

        /// Print a JSON payload instead of text.
        #[arg(long)]
        json: bool,

        /// Pause after this many steps, then resume.
        #[arg(long, value_name = "STEPS")]
        pause_after: Option<usize>,
    },

    /// Count references to every asset in the project.
    Count {
        /// Project root directory.
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Categories to scan (scene, prefab, script, asset, material, files).
        #[arg(short, long, value_delimiter = ',')]
        category: Vec<String>,

        /// Display order.
        #[arg(long, value_name = "ORDER")]
        order: Option<OrderArg>,

        /// Show at most this many entries.
        #[arg(long)]
        limit: Option<usize>,

        /// Skip files of this many bytes or more.
        #[arg(long, value_name = "BYTES")]
        size_limit: Option<u64>,

        /// Print a JSON payload instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// Tally display order.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum OrderArg {
    /// First-seen order.
    Unsorted,
    /// Highest count first.
    Descending,
    /// Lowest count first.
    Ascending,
}

impl OrderArg {
    /// Convert to the tally module's order.
    pub fn to_tally_order(self) -> crate::tally::TallyOrder {
        match self {
            OrderArg::Unsorted => crate::tally::TallyOrder::Unsorted,
            OrderArg::Descending => crate::tally::TallyOrder::Descending,
            OrderArg::Ascending => crate::tally::TallyOrder::Ascending,
        }
    }
}

/// Parse command-line arguments.
///
/// Returns the parsed Cli struct or exits on error.
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CliSuccessPayload {
    /// Construct a payload with structured data.
    pub fn with_data(message: String, data: Value) -> Self {
        Self {
            status: "ok",
            message,
            data: Some(data),
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (InvalidTarget, etc.).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Optional hint for remediation steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from a RefNavError instance.
    pub fn from_error(error: &crate::RefNavError) -> Self {
        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file: error
                    .file_path()
                    .map(|path| path.to_string_lossy().to_string()),
                hint: error.hint().map(|h| h.to_string()),
            },
        }
    }
}
