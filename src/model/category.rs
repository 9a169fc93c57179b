//! Corpus categories and the search filter bits.
//!
//! Table-driven: a file's category comes from its extension only.

use crate::error::{RefNavError, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Category of a corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Scene (`.unity`).
    Scene,
    /// Prefab (`.prefab`).
    Prefab,
    /// Script source (`.cs`).
    Script,
    /// Generic serialized asset (`.asset`).
    Asset,
    /// Material (`.mat`).
    Material,
    /// Any other file.
    Files,
}

impl Category {
    /// Convert category to string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Scene => "scene",
            Category::Prefab => "prefab",
            Category::Script => "script",
            Category::Asset => "asset",
            Category::Material => "material",
            Category::Files => "files",
        }
    }

    /// The filter bit selecting this category.
    pub fn filter_bit(self) -> CategoryFilter {
        match self {
            Category::Scene => CategoryFilter::SCENE,
            Category::Prefab => CategoryFilter::PREFAB,
            Category::Script => CategoryFilter::SCRIPT,
            Category::Asset => CategoryFilter::ASSET,
            Category::Material => CategoryFilter::MATERIAL,
            Category::Files => CategoryFilter::FILES,
        }
    }

    /// Scenes and prefabs hold object hierarchies and get sub-references.
    pub fn is_composite(self) -> bool {
        matches!(self, Category::Scene | Category::Prefab)
    }
}

/// Detect the category of a corpus path from its extension.
///
/// Extensions are matched case-sensitively; files without an extension or
/// with an unknown one fall into [`Category::Files`].
pub fn category_for_path(path: &Path) -> Category {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return Category::Files;
    };

    match extension {
        "unity" => Category::Scene,
        "prefab" => Category::Prefab,
        "cs" => Category::Script,
        "asset" => Category::Asset,
        "mat" => Category::Material,
        _ => Category::Files,
    }
}

bitflags! {
    /// Set of categories a search covers.
    ///
    /// `FILES` is the "every file" switch: it admits all categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CategoryFilter: u8 {
        /// Every file regardless of category.
        const FILES    = 1 << 0;
        /// Scenes.
        const SCENE    = 1 << 1;
        /// Prefabs.
        const PREFAB   = 1 << 2;
        /// Scripts.
        const SCRIPT   = 1 << 3;
        /// Generic assets.
        const ASSET    = 1 << 4;
        /// Materials.
        const MATERIAL = 1 << 5;
    }
}

impl CategoryFilter {
    /// True when files of `category` pass the filter.
    pub fn admits(self, category: Category) -> bool {
        self.contains(CategoryFilter::FILES) || self.contains(category.filter_bit())
    }

    /// Reject empty filters; they would create a session that can never find anything.
    pub fn validate(self) -> Result<Self> {
        if self.is_empty() {
            return Err(RefNavError::InvalidCategoryFilter(
                "filter selects no categories".to_string(),
            ));
        }
        Ok(self)
    }

    /// Parse a list of category names (`scene`, `prefab`, `script`, `asset`,
    /// `material`, `files`/`all`).
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut filter = CategoryFilter::empty();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            filter |= match name.to_ascii_lowercase().as_str() {
                "scene" | "scenes" => CategoryFilter::SCENE,
                "prefab" | "prefabs" => CategoryFilter::PREFAB,
                "script" | "scripts" => CategoryFilter::SCRIPT,
                "asset" | "assets" => CategoryFilter::ASSET,
                "material" | "materials" => CategoryFilter::MATERIAL,
                "files" | "all" => CategoryFilter::FILES,
                other => {
                    return Err(RefNavError::InvalidCategoryFilter(format!(
                        "unknown category '{}'",
                        other
                    )))
                }
            };
        }
        filter.validate()
    }
}
