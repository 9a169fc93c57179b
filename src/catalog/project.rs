//! Catalog over a project directory on disk.
//!
//! Layout conventions:
//! - the managed corpus lives under `<project>/<corpus_root>` (`Assets` by default);
//! - every asset `X` has a sidecar `X.meta` whose `guid:` line holds its
//!   global identifier;
//! - a script's class is named after its file.
//!
//! Nothing is loaded into memory, so [`AssetCatalog::loaded_hierarchy`]
//! always reports `None` and composite results are resolved statically.

use super::AssetCatalog;
use crate::model::{category_for_path, CategoryFilter, GlobalId, ObjectHandle, TypeTag};
use crate::scan;
use glob::glob;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Extension of identifier sidecar files.
pub const META_EXTENSION: &str = "meta";

/// Bytes read from the head of a `.asset` file to find its type.
pub const TYPE_HEAD_LIMIT: u64 = 4096;

/// Filesystem-backed catalog for one project.
pub struct ProjectCatalog {
    root: PathBuf,
    corpus_root: String,
    guid_index: OnceCell<HashMap<GlobalId, PathBuf>>,
}

impl ProjectCatalog {
    /// Open a project rooted at `root` whose corpus lives in `corpus_root`.
    pub fn new(root: impl Into<PathBuf>, corpus_root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            corpus_root: corpus_root.into(),
            guid_index: OnceCell::new(),
        }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the corpus directory under the project root.
    pub fn corpus_root(&self) -> &str {
        &self.corpus_root
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Every file under the corpus root (sidecars included), relative to the
    /// project root, sorted.
    fn walk(&self) -> Vec<PathBuf> {
        let base = self.root.join(&self.corpus_root);
        let Some(base_str) = base.to_str() else {
            log::warn!("Project path is not valid UTF-8: {:?}", base);
            return Vec::new();
        };
        let pattern = format!("{}/**/*", glob::Pattern::escape(base_str));

        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Invalid corpus pattern {}: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    log::debug!("Skipping unreadable corpus entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .filter_map(|path| path.strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .filter(|rel| !is_hidden(rel))
            .collect();
        paths.sort();
        paths
    }

    fn guid_index(&self) -> &HashMap<GlobalId, PathBuf> {
        self.guid_index.get_or_init(|| {
            let mut index = HashMap::new();
            for meta in self
                .walk()
                .into_iter()
                .filter(|p| p.extension().is_some_and(|e| e == META_EXTENSION))
            {
                let Some(guid) = read_meta_guid(&self.absolute(&meta)) else {
                    continue;
                };
                index.insert(guid, meta.with_extension(""));
            }
            log::debug!("Indexed {} global identifiers", index.len());
            index
        })
    }
}

impl AssetCatalog for ProjectCatalog {
    fn list_paths(&self, filter: CategoryFilter) -> Vec<PathBuf> {
        self.walk()
            .into_iter()
            .filter(|p| !p.extension().is_some_and(|e| e == META_EXTENSION))
            .filter(|p| filter.admits(category_for_path(p)))
            .collect()
    }

    fn main_type(&self, path: &Path) -> Option<TypeTag> {
        let absolute = self.absolute(path);
        if !absolute.is_file() {
            return None;
        }
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let type_name = match extension {
            "unity" => "SceneAsset",
            "prefab" => "GameObject",
            "cs" => "MonoScript",
            "mat" => "Material",
            "anim" => "AnimationClip",
            "controller" => "AnimatorController",
            "png" | "jpg" | "jpeg" | "tga" | "psd" | "exr" | "tif" | "tiff" => "Texture2D",
            "wav" | "mp3" | "ogg" | "aif" | "aiff" => "AudioClip",
            "mp4" | "mov" | "webm" | "avi" => "VideoClip",
            // Generic assets name their type on the first document.
            "asset" => return Some(first_document_type(&absolute).unwrap_or_else(|| "DefaultAsset".into())),
            _ => "DefaultAsset",
        };
        Some(TypeTag::new(type_name))
    }

    fn load_object(&self, path: &Path, type_tag: &TypeTag) -> Option<ObjectHandle> {
        self.absolute(path)
            .is_file()
            .then(|| ObjectHandle::asset(path, type_tag.clone()))
    }

    fn global_id(&self, handle: &ObjectHandle) -> Option<GlobalId> {
        let mut meta = self.absolute(&handle.path).into_os_string();
        meta.push(".");
        meta.push(META_EXTENSION);
        read_meta_guid(Path::new(&meta))
    }

    fn path_for_global_id(&self, id: &GlobalId) -> Option<PathBuf> {
        self.guid_index().get(id).cloned()
    }

    fn read_all_text(&self, path: &Path) -> std::io::Result<String> {
        fs::read_to_string(self.absolute(path))
    }

    fn file_size(&self, path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(self.absolute(path))?.len())
    }

    fn declared_type(&self, handle: &ObjectHandle) -> TypeTag {
        if handle.type_tag.is_script() {
            TypeTag::new(handle.name())
        } else {
            handle.type_tag.clone()
        }
    }

    fn script_of(&self, instance: &ObjectHandle) -> Option<ObjectHandle> {
        let local_id = instance.local_id.as_ref()?;
        let text = self.read_all_text(&instance.path).ok()?;
        let document = scan::scan(&text).find(|doc| &doc.local_id == local_id)?;
        let script_field = document.field("m_Script")?;
        let (_, token) = scan::find_global_ids(script_field).next()?;
        self.object_for_global_id(&GlobalId::parse(token)?)
    }
}

/// Read the `guid:` line of a sidecar file.
fn read_meta_guid(meta_path: &Path) -> Option<GlobalId> {
    let text = fs::read_to_string(meta_path).ok()?;
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("guid:"))
        .find_map(|value| GlobalId::parse(value.trim()))
}

/// Type named by the first document of a text asset.
///
/// Only the head of the file is read, at most [`TYPE_HEAD_LIMIT`] bytes.
/// Binary or headless files yield `None`.
fn first_document_type(path: &Path) -> Option<TypeTag> {
    let file = File::open(path).ok()?;
    let mut in_document = false;
    for line in BufReader::new(file.take(TYPE_HEAD_LIMIT)).lines() {
        let line = line.ok()?;
        if line.starts_with(scan::DOCUMENT_MARKER) {
            in_document = true;
            continue;
        }
        if in_document && !line.trim().is_empty() && scan::indentation(&line) == 0 {
            let name = line.trim().trim_end_matches(':').trim();
            return (!name.is_empty()).then(|| TypeTag::new(name));
        }
    }
    None
}

/// Dot-prefixed and `~`-suffixed entries are not part of the corpus.
fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name.starts_with('.') || name.ends_with('~')
    })
}
