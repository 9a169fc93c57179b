//! TOML configuration.
//!
//! Every section and key is optional; a missing file section takes the
//! defaults below. Command-line flags override whatever is loaded here.

use crate::corpus::{CorpusOptions, DEFAULT_CORPUS_ROOT, DEFAULT_EXCLUDED_TYPES, DEFAULT_FILE_SIZE_LIMIT};
use crate::error::{RefNavError, Result};
use crate::history::DEFAULT_CAPACITY;
use crate::model::{CategoryFilter, TypeTag};
use crate::scan::DEFAULT_INDENT_UNIT;
use crate::tally::TallyOrder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Whole configuration file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct NavigatorConfig {
    /// `[corpus]`
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// `[scan]`
    #[serde(default)]
    pub scan: ScanConfig,
    /// `[search]`
    #[serde(default)]
    pub search: SearchConfig,
    /// `[count]`
    #[serde(default)]
    pub count: CountConfig,
    /// `[history]`
    #[serde(default)]
    pub history: HistoryConfig,
    /// `[symbols]`
    #[serde(default)]
    pub symbols: SymbolsConfig,
    /// `[progress]`
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Which files make up the corpus.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CorpusConfig {
    /// Managed corpus root under the project directory.
    #[serde(default = "default_root")]
    pub root: String,
    /// Files of this many bytes or more are skipped.
    #[serde(default = "default_file_size_limit")]
    pub file_size_limit: u64,
    /// Main types never scanned.
    #[serde(default = "default_excluded_types")]
    pub excluded_types: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            file_size_limit: default_file_size_limit(),
            excluded_types: default_excluded_types(),
        }
    }
}

fn default_root() -> String {
    DEFAULT_CORPUS_ROOT.to_string()
}
fn default_file_size_limit() -> u64 {
    DEFAULT_FILE_SIZE_LIMIT
}
fn default_excluded_types() -> Vec<String> {
    DEFAULT_EXCLUDED_TYPES.iter().map(|t| t.to_string()).collect()
}

impl CorpusConfig {
    /// Enumeration options for this section.
    pub fn options(&self) -> CorpusOptions {
        CorpusOptions {
            root: PathBuf::from(&self.root),
            file_size_limit: self.file_size_limit,
            excluded_types: self.excluded_types.iter().map(|t| TypeTag::new(t.as_str())).collect(),
        }
    }
}

/// Scanner settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScanConfig {
    /// Indentation width of field lines.
    #[serde(default = "default_indent_unit")]
    pub indent_unit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            indent_unit: default_indent_unit(),
        }
    }
}

fn default_indent_unit() -> usize {
    DEFAULT_INDENT_UNIT
}

/// Defaults of `refnav find`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Categories searched.
    #[serde(default = "default_search_categories")]
    pub categories: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            categories: default_search_categories(),
        }
    }
}

fn default_search_categories() -> Vec<String> {
    vec!["scene".to_string(), "prefab".to_string(), "script".to_string()]
}

/// Defaults of `refnav count`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CountConfig {
    /// Categories counted.
    #[serde(default = "default_count_categories")]
    pub categories: Vec<String>,
    /// Display order.
    #[serde(default)]
    pub order: TallyOrder,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            categories: default_count_categories(),
            order: TallyOrder::default(),
        }
    }
}

fn default_count_categories() -> Vec<String> {
    vec![
        "scene".to_string(),
        "prefab".to_string(),
        "material".to_string(),
        "asset".to_string(),
    ]
}

/// Session history settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HistoryConfig {
    /// Sessions kept before the oldest is evicted.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// External code-symbol search.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SymbolsConfig {
    /// Program to run; absent means not configured.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments, with `{script}` and `{class}` placeholders.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Persisted progress scale.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProgressConfig {
    /// State file, relative to the project root.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".refnav/progress.json")
}

/// Parse configuration text. `path` is only used in error messages.
pub fn parse_config(content: &str, path: &Path) -> Result<NavigatorConfig> {
    let config: NavigatorConfig = toml::from_str(content).map_err(|e| RefNavError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate(&config, path)?;
    Ok(config)
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<NavigatorConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RefNavError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&content, path)
}

fn validate(config: &NavigatorConfig, path: &Path) -> Result<()> {
    let invalid = |message: &str| RefNavError::Config {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    if config.scan.indent_unit == 0 {
        return Err(invalid("scan.indent_unit must be > 0"));
    }
    if config.corpus.file_size_limit == 0 {
        return Err(invalid("corpus.file_size_limit must be > 0"));
    }
    if config.corpus.root.trim().is_empty() {
        return Err(invalid("corpus.root must not be empty"));
    }
    if config.history.capacity == 0 {
        return Err(invalid("history.capacity must be >= 1"));
    }
    CategoryFilter::from_names(&config.search.categories)?;
    CategoryFilter::from_names(&config.count.categories)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("", Path::new("refnav.toml")).unwrap();
        assert_eq!(config, NavigatorConfig::default());
        assert_eq!(config.corpus.root, "Assets");
        assert_eq!(config.corpus.file_size_limit, 10_000_000);
        assert_eq!(config.history.capacity, 20);
        assert_eq!(config.count.order, TallyOrder::Descending);
        assert!(config.symbols.command.is_none());
        assert_eq!(config.corpus.options(), CorpusOptions::default());
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
[corpus]
file_size_limit = 2048

[count]
order = "ascending"

[symbols]
command = "symfind"
args = ["--class", "{class}"]
"#;
        let config = parse_config(text, Path::new("refnav.toml")).unwrap();
        assert_eq!(config.corpus.file_size_limit, 2048);
        assert_eq!(config.corpus.root, "Assets");
        assert_eq!(config.count.order, TallyOrder::Ascending);
        assert_eq!(config.symbols.command.as_deref(), Some("symfind"));
        assert_eq!(config.symbols.args.len(), 2);
    }

    #[test]
    fn test_invalid_values() {
        let err = parse_config("[scan]\nindent_unit = 0\n", Path::new("bad.toml")).unwrap_err();
        assert_eq!(err.kind(), "Config");

        let err = parse_config("[search]\ncategories = [\"sounds\"]\n", Path::new("bad.toml"))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidCategoryFilter");

        let err = parse_config("[corpus\n", Path::new("bad.toml")).unwrap_err();
        assert_eq!(err.file_path(), Some(Path::new("bad.toml")));
    }
}
