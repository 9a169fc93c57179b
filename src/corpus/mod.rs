//! Corpus enumeration.
//!
//! A thin layer over [`AssetCatalog::list_paths`] that narrows the listing
//! to the managed corpus root, drops bulk media types and oversized files,
//! and orders what remains by ascending size so small files (and therefore
//! the first results) come back quickly.

use crate::catalog::AssetCatalog;
use crate::error::IoSkip;
use crate::model::{category_for_path, Category, CategoryFilter, TypeTag};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default managed corpus root.
pub const DEFAULT_CORPUS_ROOT: &str = "Assets";

/// Default upper bound on the size of a file that will be read.
pub const DEFAULT_FILE_SIZE_LIMIT: u64 = 10_000_000;

/// Types that are large and cannot hold outbound references.
pub const DEFAULT_EXCLUDED_TYPES: [&str; 4] =
    ["LightingDataAsset", "AudioClip", "VideoClip", "Texture2D"];

/// Enumeration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    /// Only paths under this directory are part of the corpus.
    pub root: PathBuf,
    /// Files of this size or larger are skipped.
    pub file_size_limit: u64,
    /// Main types that are never scanned.
    pub excluded_types: Vec<TypeTag>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_CORPUS_ROOT),
            file_size_limit: DEFAULT_FILE_SIZE_LIMIT,
            excluded_types: DEFAULT_EXCLUDED_TYPES.iter().map(|t| TypeTag::new(*t)).collect(),
        }
    }
}

impl CorpusOptions {
    /// True if files whose main object has `type_tag` are never scanned.
    pub fn is_excluded(&self, type_tag: &TypeTag) -> bool {
        self.excluded_types.contains(type_tag)
    }

    /// True if `path` lies under the corpus root and has an extension.
    pub fn in_corpus(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && path.extension().is_some_and(|e| !e.is_empty())
    }
}

/// One candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusEntry {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Category derived from the extension.
    pub category: Category,
    /// Type of the main object.
    pub type_tag: TypeTag,
    /// Size in bytes.
    pub size: u64,
}

/// Resumable cursor over the candidate files of one session.
///
/// The listing is taken once, on the first call to [`next_entry`], and is
/// stable afterwards: [`reset`] rewinds the cursor over the same listing
/// rather than asking the catalog again.
///
/// [`next_entry`]: CorpusEnumerator::next_entry
/// [`reset`]: CorpusEnumerator::reset
#[derive(Debug, Clone)]
pub struct CorpusEnumerator {
    filter: CategoryFilter,
    options: CorpusOptions,
    entries: Option<Vec<CorpusEntry>>,
    skipped: Vec<IoSkip>,
    cursor: usize,
}

impl CorpusEnumerator {
    /// Enumerator over the files passing `filter`.
    pub fn new(filter: CategoryFilter, options: CorpusOptions) -> Self {
        Self {
            filter,
            options,
            entries: None,
            skipped: Vec::new(),
            cursor: 0,
        }
    }

    /// Settings in use.
    pub fn options(&self) -> &CorpusOptions {
        &self.options
    }

    /// True once the listing has been taken.
    pub fn is_listed(&self) -> bool {
        self.entries.is_some()
    }

    /// Take the listing now if it has not been taken yet.
    pub fn ensure_listed(&mut self, catalog: &dyn AssetCatalog) {
        if self.entries.is_none() {
            let (entries, skipped) = self.list(catalog);
            log::debug!(
                "Corpus listing: {} candidates, {} skipped",
                entries.len(),
                skipped.len()
            );
            self.entries = Some(entries);
            self.skipped = skipped;
        }
    }

    /// Next candidate, or `None` when the corpus is exhausted.
    pub fn next_entry(&mut self, catalog: &dyn AssetCatalog) -> Option<CorpusEntry> {
        self.ensure_listed(catalog);
        let entry = self.entries.as_ref()?.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(entry)
    }

    /// Number of candidates, once listed.
    pub fn total(&self) -> Option<usize> {
        self.entries.as_ref().map(Vec::len)
    }

    /// Number of candidates handed out so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Files dropped from the listing.
    pub fn skipped(&self) -> &[IoSkip] {
        &self.skipped
    }

    /// Rewind to the first candidate.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    fn list(&self, catalog: &dyn AssetCatalog) -> (Vec<CorpusEntry>, Vec<IoSkip>) {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for path in catalog.list_paths(self.filter) {
            if !self.options.in_corpus(&path) {
                continue;
            }
            let category = category_for_path(&path);
            if !self.filter.admits(category) {
                continue;
            }
            // Size first: typing an asset may read its head.
            let size = match catalog.file_size(&path) {
                Ok(size) => size,
                Err(e) => {
                    let skip = IoSkip::UnreadableFile {
                        path,
                        reason: e.to_string(),
                    };
                    log::warn!("{}", skip);
                    skipped.push(skip);
                    continue;
                }
            };
            if size >= self.options.file_size_limit {
                let skip = IoSkip::FileTooLarge {
                    path,
                    size,
                    limit: self.options.file_size_limit,
                };
                log::warn!("{}", skip);
                skipped.push(skip);
                continue;
            }

            let Some(type_tag) = catalog.main_type(&path) else {
                log::debug!("No main type for {}, skipping", path.display());
                continue;
            };
            if self.options.is_excluded(&type_tag) {
                continue;
            }

            entries.push(CorpusEntry {
                path,
                category,
                type_tag,
                size,
            });
        }

        entries.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.path.cmp(&b.path)));
        (entries, skipped)
    }
}
