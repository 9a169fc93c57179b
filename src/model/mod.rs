//! Core identifier and handle types.
//!
//! A [`GlobalId`] names one asset across the whole corpus. A [`LocalId`]
//! names one embedded document inside a single file and is only meaningful
//! together with that file's path, which is why [`ObjectHandle`] always
//! carries both.

pub mod category;

pub use category::{category_for_path, Category, CategoryFilter};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of characters in a serialized global identifier.
pub const GLOBAL_ID_LEN: usize = 32;

/// Corpus-wide asset identifier (32 lowercase alphanumeric characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalId(String);

impl GlobalId {
    /// Validate and wrap a token. Returns `None` unless the token has the exact
    /// length and charset of a serialized identifier.
    pub fn parse(token: &str) -> Option<Self> {
        if token.len() == GLOBAL_ID_LEN && token.bytes().all(is_global_id_byte) {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Charset of a serialized global identifier.
pub fn is_global_id_byte(b: u8) -> bool {
    b.is_ascii_digit() || b.is_ascii_lowercase()
}

/// File-scoped document identifier (the `&123` anchor of a document).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Object type name as the catalog reports it (`GameObject`, `MonoScript`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Wrap a type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for a type tag naming a script asset.
    pub fn is_script(&self) -> bool {
        self.0 == "MonoScript"
    }

    /// True for instances whose search should be redirected to their script.
    pub fn is_script_instance(&self) -> bool {
        matches!(self.0.as_str(), "MonoBehaviour" | "ScriptableObject")
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to an object known to the catalog.
///
/// Main assets have no `local_id`. Objects embedded in a file (components,
/// hierarchy members) carry the `LocalId` of their document; the pair
/// `(path, local_id)` is the only meaningful identity for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle {
    /// Asset path relative to the project root.
    pub path: PathBuf,
    /// Object type.
    pub type_tag: TypeTag,
    /// Document within `path`, for embedded objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<LocalId>,
}

impl ObjectHandle {
    /// Handle for the main object of an asset file.
    pub fn asset(path: impl Into<PathBuf>, type_tag: impl Into<TypeTag>) -> Self {
        Self {
            path: path.into(),
            type_tag: type_tag.into(),
            local_id: None,
        }
    }

    /// Handle for a document embedded in an asset file.
    pub fn embedded(
        path: impl Into<PathBuf>,
        local_id: LocalId,
        type_tag: impl Into<TypeTag>,
    ) -> Self {
        Self {
            path: path.into(),
            type_tag: type_tag.into(),
            local_id: Some(local_id),
        }
    }

    /// Asset path of the handle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Object name as displayed: the file stem of its asset.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.local_id {
            Some(local) => write!(f, "{}#{} ({})", self.path.display(), local, self.type_tag),
            None => write!(f, "{} ({})", self.path.display(), self.type_tag),
        }
    }
}

impl From<String> for TypeTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}
