//! In-memory catalog.
//!
//! Files are registered with a builder-style API and enumerated in
//! registration order. Unlike [`super::ProjectCatalog`] it can simulate a
//! loaded object hierarchy, type assignability and oversized or unreadable
//! files without touching the disk.

use super::AssetCatalog;
use crate::model::{category_for_path, CategoryFilter, GlobalId, ObjectHandle, TypeTag};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct MemoryFile {
    type_tag: TypeTag,
    global_id: Option<GlobalId>,
    text: Option<String>,
    size: Option<u64>,
}

/// Corpus held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    files: IndexMap<PathBuf, MemoryFile>,
    hierarchies: HashMap<PathBuf, Vec<ObjectHandle>>,
    assignable: HashSet<(TypeTag, TypeTag)>,
    scripts: HashMap<ObjectHandle, ObjectHandle>,
    declared: HashMap<ObjectHandle, TypeTag>,
}

impl MemoryCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a readable file. `guid` must be a well-formed identifier to
    /// be registered; anything else leaves the file without one.
    pub fn add_file(
        &mut self,
        path: impl Into<PathBuf>,
        type_tag: impl Into<TypeTag>,
        guid: Option<&str>,
        text: impl Into<String>,
    ) -> &mut Self {
        self.files.insert(
            path.into(),
            MemoryFile {
                type_tag: type_tag.into(),
                global_id: guid.and_then(GlobalId::parse),
                text: Some(text.into()),
                size: None,
            },
        );
        self
    }

    /// Register a file whose reported size differs from its text length.
    pub fn add_sized_file(
        &mut self,
        path: impl Into<PathBuf>,
        type_tag: impl Into<TypeTag>,
        guid: Option<&str>,
        text: impl Into<String>,
        size: u64,
    ) -> &mut Self {
        let path = path.into();
        self.add_file(path.clone(), type_tag, guid, text);
        if let Some(file) = self.files.get_mut(&path) {
            file.size = Some(size);
        }
        self
    }

    /// Register a file that is listed but fails to read.
    pub fn add_unreadable_file(
        &mut self,
        path: impl Into<PathBuf>,
        type_tag: impl Into<TypeTag>,
    ) -> &mut Self {
        self.files.insert(
            path.into(),
            MemoryFile {
                type_tag: type_tag.into(),
                global_id: None,
                text: None,
                size: Some(0),
            },
        );
        self
    }

    /// Mark the composite asset at `path` as loaded with these members.
    pub fn set_hierarchy(
        &mut self,
        path: impl Into<PathBuf>,
        members: Vec<ObjectHandle>,
    ) -> &mut Self {
        self.hierarchies.insert(path.into(), members);
        self
    }

    /// Declare `derived` assignable to `base`.
    pub fn allow_assignment(
        &mut self,
        base: impl Into<TypeTag>,
        derived: impl Into<TypeTag>,
    ) -> &mut Self {
        self.assignable.insert((base.into(), derived.into()));
        self
    }

    /// Bind an instance to the script that backs it.
    pub fn set_script(&mut self, instance: ObjectHandle, script: ObjectHandle) -> &mut Self {
        self.scripts.insert(instance, script);
        self
    }

    /// Override the type an object declares to its instances.
    pub fn set_declared_type(
        &mut self,
        handle: ObjectHandle,
        type_tag: impl Into<TypeTag>,
    ) -> &mut Self {
        self.declared.insert(handle, type_tag.into());
        self
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not in the catalog", path.display()),
        )
    }
}

impl AssetCatalog for MemoryCatalog {
    fn list_paths(&self, filter: CategoryFilter) -> Vec<PathBuf> {
        self.files
            .keys()
            .filter(|path| filter.admits(category_for_path(path)))
            .cloned()
            .collect()
    }

    fn main_type(&self, path: &Path) -> Option<TypeTag> {
        self.files.get(path).map(|file| file.type_tag.clone())
    }

    fn load_object(&self, path: &Path, type_tag: &TypeTag) -> Option<ObjectHandle> {
        let file = self.files.get(path)?;
        (&file.type_tag == type_tag).then(|| ObjectHandle::asset(path, type_tag.clone()))
    }

    fn global_id(&self, handle: &ObjectHandle) -> Option<GlobalId> {
        self.files.get(&handle.path)?.global_id.clone()
    }

    fn path_for_global_id(&self, id: &GlobalId) -> Option<PathBuf> {
        self.files
            .iter()
            .find(|(_, file)| file.global_id.as_ref() == Some(id))
            .map(|(path, _)| path.clone())
    }

    fn read_all_text(&self, path: &Path) -> io::Result<String> {
        let file = self.files.get(path).ok_or_else(|| Self::not_found(path))?;
        file.text.clone().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8")
        })
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        let file = self.files.get(path).ok_or_else(|| Self::not_found(path))?;
        Ok(file
            .size
            .unwrap_or_else(|| file.text.as_ref().map_or(0, |t| t.len() as u64)))
    }

    fn loaded_hierarchy(&self, path: &Path) -> Option<Vec<ObjectHandle>> {
        self.hierarchies.get(path).cloned()
    }

    fn is_assignable_from(&self, base: &TypeTag, derived: &TypeTag) -> bool {
        base == derived || self.assignable.contains(&(base.clone(), derived.clone()))
    }

    fn declared_type(&self, handle: &ObjectHandle) -> TypeTag {
        self.declared
            .get(handle)
            .cloned()
            .unwrap_or_else(|| handle.type_tag.clone())
    }

    fn script_of(&self, instance: &ObjectHandle) -> Option<ObjectHandle> {
        self.scripts.get(instance).cloned()
    }
}
