//! Code-symbol references for script targets.
//!
//! Finding where a script's class is used from other source files needs a
//! compiler front end, which this crate does not carry. The search is
//! delegated through [`SymbolSearch`]; [`CommandSymbolSearch`] runs an
//! external tool and reads `file:line:column` locations from its output.

use crate::catalog::AssetCatalog;
use crate::error::ExternalServiceUnavailable;
use crate::model::{ObjectHandle, TypeTag};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

/// Placeholder replaced by the script's path in command arguments.
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Placeholder replaced by the script's class name in command arguments.
pub const CLASS_PLACEHOLDER: &str = "{class}";

/// One location reported by the symbol search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolLocation {
    /// File as reported by the service.
    pub file_path: PathBuf,
    /// Line number (1-based).
    pub line: usize,
    /// Column number as reported.
    pub column: usize,
}

/// External search for references to a script's symbols.
pub trait SymbolSearch {
    /// Every location referencing the class defined by `script`.
    fn find_symbol_references(
        &self,
        script: &ObjectHandle,
        script_path: &Path,
    ) -> Result<Vec<SymbolLocation>, ExternalServiceUnavailable>;
}

/// Stand-in used when no symbol search is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl SymbolSearch for Unconfigured {
    fn find_symbol_references(
        &self,
        _script: &ObjectHandle,
        _script_path: &Path,
    ) -> Result<Vec<SymbolLocation>, ExternalServiceUnavailable> {
        Err(ExternalServiceUnavailable::new("no symbol search command configured"))
    }
}

/// Symbol search backed by an external command.
///
/// Arguments may contain [`SCRIPT_PLACEHOLDER`] and [`CLASS_PLACEHOLDER`].
/// The command runs in the project root; every stdout line of the form
/// `file:line:column[:anything]` is one location, other lines are ignored.
#[derive(Debug, Clone)]
pub struct CommandSymbolSearch {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandSymbolSearch {
    /// Search with `program args...` run inside `working_dir`.
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
        }
    }

    fn expand_args(&self, script: &ObjectHandle, script_path: &Path) -> Vec<String> {
        let script_path = script_path.to_string_lossy();
        let class = script.name();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(SCRIPT_PLACEHOLDER, &script_path)
                    .replace(CLASS_PLACEHOLDER, &class)
            })
            .collect()
    }
}

impl SymbolSearch for CommandSymbolSearch {
    fn find_symbol_references(
        &self,
        script: &ObjectHandle,
        script_path: &Path,
    ) -> Result<Vec<SymbolLocation>, ExternalServiceUnavailable> {
        let binary = which(&self.program).map_err(|e| {
            ExternalServiceUnavailable::new(format!("{} not found: {}", self.program, e))
        })?;

        let output = Command::new(&binary)
            .args(self.expand_args(script, script_path))
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| {
                ExternalServiceUnavailable::new(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExternalServiceUnavailable::new(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_locations(&stdout))
    }
}

/// Parse every `file:line:column` line of tool output.
pub fn parse_locations(output: &str) -> Vec<SymbolLocation> {
    output.lines().filter_map(parse_location_line).collect()
}

/// Parse `file:line:column[:rest]`. The file part may itself contain colons
/// (drive letters), so the first colon followed by two numbers wins.
fn parse_location_line(line: &str) -> Option<SymbolLocation> {
    let line = line.trim();
    line.match_indices(':').find_map(|(idx, _)| {
        let file = &line[..idx];
        if file.is_empty() {
            return None;
        }
        let mut rest = line[idx + 1..].splitn(3, ':');
        let line_num = rest.next()?.trim().parse::<usize>().ok()?;
        let column = rest.next()?.trim().parse::<usize>().ok()?;
        Some(SymbolLocation {
            file_path: PathBuf::from(file),
            line: line_num,
            column,
        })
    })
}

/// A code-symbol hit merged into result form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticResult {
    /// File as reported by the service.
    pub file_path: PathBuf,
    /// Same file relative to the project root, when it lies inside it.
    pub asset_path: Option<PathBuf>,
    /// Line number (1-based).
    pub line: usize,
    /// Column number as reported.
    pub column: usize,
    /// Script asset at `asset_path`, if the catalog knows it.
    pub object: Option<ObjectHandle>,
}

impl AnalyticResult {
    /// Attach project-relative path and catalog object to a location.
    pub fn from_location(
        location: SymbolLocation,
        project_root: &Path,
        catalog: &dyn AssetCatalog,
    ) -> Self {
        let asset_path = if location.file_path.is_absolute() {
            location
                .file_path
                .strip_prefix(project_root)
                .ok()
                .map(Path::to_path_buf)
        } else {
            Some(location.file_path.clone())
        };
        let object = asset_path
            .as_ref()
            .and_then(|path| catalog.load_object(path, &TypeTag::new("MonoScript")));
        Self {
            file_path: location.file_path,
            asset_path,
            line: location.line,
            column: location.column,
            object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;

    #[test]
    fn test_parse_locations() {
        let output = "\
Assets/Scripts/Enemy.cs:12:9: var p = new Player();
warning: something unrelated
C:\\Project\\Assets\\Boss.cs:3:1
Assets/Broken.cs:x:1
";
        let locations = parse_locations(output);
        assert_eq!(
            locations,
            vec![
                SymbolLocation {
                    file_path: PathBuf::from("Assets/Scripts/Enemy.cs"),
                    line: 12,
                    column: 9,
                },
                SymbolLocation {
                    file_path: PathBuf::from("C:\\Project\\Assets\\Boss.cs"),
                    line: 3,
                    column: 1,
                },
            ]
        );
    }

    #[test]
    fn test_unconfigured_is_unavailable() {
        let script = ObjectHandle::asset("Assets/Player.cs", "MonoScript");
        let err = Unconfigured
            .find_symbol_references(&script, Path::new("Assets/Player.cs"))
            .unwrap_err();
        assert!(err.reason.contains("configured"));
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let search = CommandSymbolSearch::new("refnav-no-such-tool", vec![], ".");
        let script = ObjectHandle::asset("Assets/Player.cs", "MonoScript");
        assert!(search
            .find_symbol_references(&script, Path::new("Assets/Player.cs"))
            .is_err());
    }

    #[test]
    fn test_expand_args() {
        let search = CommandSymbolSearch::new(
            "tool",
            vec!["--file={script}".to_string(), "{class}".to_string()],
            ".",
        );
        let script = ObjectHandle::asset("Assets/Player.cs", "MonoScript");
        assert_eq!(
            search.expand_args(&script, Path::new("Assets/Player.cs")),
            vec!["--file=Assets/Player.cs".to_string(), "Player".to_string()]
        );
    }

    #[test]
    fn test_analytic_result_paths() {
        let mut catalog = MemoryCatalog::new();
        catalog.add_file("Assets/Enemy.cs", "MonoScript", None, "");
        let root = std::env::temp_dir().join("project");

        let absolute = AnalyticResult::from_location(
            SymbolLocation {
                file_path: root.join("Assets/Enemy.cs"),
                line: 4,
                column: 2,
            },
            &root,
            &catalog,
        );
        assert_eq!(absolute.asset_path, Some(PathBuf::from("Assets/Enemy.cs")));
        assert_eq!(
            absolute.object,
            Some(ObjectHandle::asset("Assets/Enemy.cs", "MonoScript"))
        );

        let outside = AnalyticResult::from_location(
            SymbolLocation {
                file_path: std::env::temp_dir().join("elsewhere/Tool.cs"),
                line: 1,
                column: 1,
            },
            &root,
            &catalog,
        );
        assert!(outside.asset_path.is_none());
        assert!(outside.object.is_none());
    }
}
