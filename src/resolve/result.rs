//! Per-file search results.

use super::ReferenceHit;
use crate::catalog::AssetCatalog;
use crate::model::{Category, GlobalId, ObjectHandle, TypeTag};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Variant-specific part of an [`AssetResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultDetail {
    /// Plain asset (material, generic asset, any other file).
    Asset,
    /// Script source.
    Script,
    /// Scene, with the embedded objects involved in the reference.
    Scene {
        /// Objects in first-discovered order.
        sub_references: Vec<ObjectHandle>,
    },
    /// Prefab, with the embedded objects involved in the reference.
    Prefab {
        /// Objects in first-discovered order.
        sub_references: Vec<ObjectHandle>,
    },
}

impl ResultDetail {
    /// Empty detail for a category.
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Scene => ResultDetail::Scene {
                sub_references: Vec::new(),
            },
            Category::Prefab => ResultDetail::Prefab {
                sub_references: Vec::new(),
            },
            Category::Script => ResultDetail::Script,
            Category::Asset | Category::Material | Category::Files => ResultDetail::Asset,
        }
    }

    /// Sub-references of composite results; empty for the rest.
    pub fn sub_references(&self) -> &[ObjectHandle] {
        match self {
            ResultDetail::Scene { sub_references } | ResultDetail::Prefab { sub_references } => {
                sub_references
            }
            ResultDetail::Asset | ResultDetail::Script => &[],
        }
    }
}

/// A corpus file confirmed to reference the search target.
#[derive(Debug, Clone, Serialize)]
pub struct AssetResult {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Category of the file.
    pub category: Category,
    /// Type of the file's main object.
    pub type_tag: TypeTag,
    /// The loaded main object, if the catalog could load it.
    pub object: Option<ObjectHandle>,
    /// Attributed hits in file order.
    pub hits: Vec<ReferenceHit>,
    /// Variant-specific data.
    pub detail: ResultDetail,
    #[serde(skip)]
    global_id: OnceCell<Option<GlobalId>>,
}

impl AssetResult {
    /// New result with no hits and an empty detail for its category.
    pub fn new(path: impl Into<PathBuf>, category: Category, type_tag: TypeTag) -> Self {
        Self {
            path: path.into(),
            category,
            type_tag,
            object: None,
            hits: Vec::new(),
            detail: ResultDetail::for_category(category),
            global_id: OnceCell::new(),
        }
    }

    /// Path of the referencing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name of the referencing object.
    pub fn name(&self) -> Option<String> {
        self.object.as_ref().map(ObjectHandle::name)
    }

    /// Sub-references of composite results.
    pub fn sub_references(&self) -> &[ObjectHandle] {
        self.detail.sub_references()
    }

    /// Global identifier of the referencing file, looked up on first use.
    pub fn global_id(&self, catalog: &dyn AssetCatalog) -> Option<&GlobalId> {
        self.global_id
            .get_or_init(|| {
                let handle = self
                    .object
                    .clone()
                    .unwrap_or_else(|| ObjectHandle::asset(&self.path, self.type_tag.clone()));
                catalog.global_id(&handle)
            })
            .as_ref()
    }
}

impl PartialEq for AssetResult {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.category == other.category
            && self.type_tag == other.type_tag
            && self.object == other.object
            && self.hits == other.hits
            && self.detail == other.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;

    #[test]
    fn test_detail_for_category() {
        assert_eq!(
            ResultDetail::for_category(Category::Scene).sub_references(),
            &[] as &[ObjectHandle]
        );
        assert_eq!(ResultDetail::for_category(Category::Material), ResultDetail::Asset);
        assert_eq!(ResultDetail::for_category(Category::Script), ResultDetail::Script);
    }

    #[test]
    fn test_global_id_is_resolved_lazily() {
        let guid = "0123456789abcdef0123456789abcdef";
        let mut catalog = MemoryCatalog::new();
        catalog.add_file("Assets/Red.mat", "Material", Some(guid), "");

        let result = AssetResult::new("Assets/Red.mat", Category::Material, "Material".into());
        assert_eq!(result.global_id(&catalog).map(GlobalId::as_str), Some(guid));
        // Cached: a catalog that knows nothing still returns the first answer.
        assert_eq!(
            result.global_id(&MemoryCatalog::new()).map(GlobalId::as_str),
            Some(guid)
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = AssetResult::new("Assets/Hero.prefab", Category::Prefab, "GameObject".into());
        result.detail = ResultDetail::Prefab {
            sub_references: vec![ObjectHandle::asset("Assets/Player.cs", "MonoScript")],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category"], "prefab");
        assert_eq!(json["detail"]["kind"], "prefab");
        assert_eq!(json["detail"]["sub_references"][0]["path"], "Assets/Player.cs");
        assert!(json.get("global_id").is_none());
    }
}
