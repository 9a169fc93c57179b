//! Read-only view of the asset storage layer.
//!
//! The search core never touches storage directly; everything it needs to
//! know about the corpus goes through [`AssetCatalog`]. Two implementations
//! ship with the crate:
//!
//! - [`ProjectCatalog`] reads a project tree on disk (`.meta` sidecars carry
//!   each asset's global identifier).
//! - [`MemoryCatalog`] is an in-memory corpus with optional loaded
//!   hierarchies, used by tests and embedders.

pub mod memory;
pub mod project;

pub use memory::MemoryCatalog;
pub use project::ProjectCatalog;

use crate::model::{CategoryFilter, GlobalId, LocalId, ObjectHandle, TypeTag};
use std::path::{Path, PathBuf};

/// Operations the search core consumes from the asset storage layer.
///
/// Every method is a read. Lookups that can fail return `Option` and the
/// core treats `None` as "unknown" rather than as an error.
pub trait AssetCatalog {
    /// All corpus paths whose category passes `filter`, relative to the
    /// project root.
    fn list_paths(&self, filter: CategoryFilter) -> Vec<PathBuf>;

    /// Type of the main object stored at `path`.
    fn main_type(&self, path: &Path) -> Option<TypeTag>;

    /// Load the main object at `path` as `type_tag`.
    fn load_object(&self, path: &Path, type_tag: &TypeTag) -> Option<ObjectHandle>;

    /// Global identifier of the asset that holds `handle`.
    fn global_id(&self, handle: &ObjectHandle) -> Option<GlobalId>;

    /// Asset path registered for a global identifier.
    fn path_for_global_id(&self, id: &GlobalId) -> Option<PathBuf>;

    /// File-scoped identifier of an embedded object; `"0"` when unknown.
    fn local_id(&self, component: &ObjectHandle) -> LocalId {
        component
            .local_id
            .clone()
            .unwrap_or_else(|| LocalId::new("0"))
    }

    /// Full text of the file at `path`.
    fn read_all_text(&self, path: &Path) -> std::io::Result<String>;

    /// Size of the file at `path` in bytes.
    fn file_size(&self, path: &Path) -> std::io::Result<u64>;

    /// Every embedded object of a composite asset that is currently loaded
    /// in memory, in hierarchy order. `None` when nothing is loaded and the
    /// file can only be inspected statically.
    fn loaded_hierarchy(&self, _path: &Path) -> Option<Vec<ObjectHandle>> {
        None
    }

    /// True when a value of type `derived` can be used where `base` is
    /// expected.
    fn is_assignable_from(&self, base: &TypeTag, derived: &TypeTag) -> bool {
        base == derived
    }

    /// Type an object declares to its instances. For scripts this is the
    /// class they define rather than `MonoScript`.
    fn declared_type(&self, handle: &ObjectHandle) -> TypeTag {
        handle.type_tag.clone()
    }

    /// Script asset backing a behaviour or scriptable instance.
    fn script_of(&self, _instance: &ObjectHandle) -> Option<ObjectHandle> {
        None
    }

    /// Resolve a global identifier straight to its main object.
    fn object_for_global_id(&self, id: &GlobalId) -> Option<ObjectHandle> {
        let path = self.path_for_global_id(id)?;
        let type_tag = self.main_type(&path)?;
        self.load_object(&path, &type_tag)
    }
}
