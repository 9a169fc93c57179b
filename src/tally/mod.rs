//! Corpus-wide reference counting.
//!
//! Every identifier-shaped token in every scanned file bumps the count of
//! its [`TallyEntry`]. Entries are created on first sight and bound to the
//! object the catalog resolves for them; identifiers the catalog no longer
//! knows (deleted assets named by stale references) are still counted but
//! stay invalid and are hidden from ranked output.

use crate::catalog::AssetCatalog;
use crate::corpus::CorpusEntry;
use crate::model::{GlobalId, ObjectHandle};
use crate::scan;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Occurrence count of one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    /// Counted identifier.
    pub global_id: GlobalId,
    /// Number of occurrences seen so far. Never decreases.
    pub count: u64,
    /// Object the identifier resolves to.
    pub object: Option<ObjectHandle>,
    /// Asset path the identifier resolves to.
    pub path: Option<PathBuf>,
    /// True once `object` resolved.
    pub valid: bool,
}

impl TallyEntry {
    /// Entry for `global_id`, resolved through `catalog`.
    pub fn resolve(global_id: GlobalId, catalog: &dyn AssetCatalog) -> Self {
        let path = catalog.path_for_global_id(&global_id);
        let object = path.as_ref().and_then(|path| {
            let type_tag = catalog.main_type(path)?;
            catalog.load_object(path, &type_tag)
        });
        Self {
            valid: object.is_some(),
            global_id,
            count: 0,
            object,
            path,
        }
    }

    /// Count one more occurrence.
    pub fn increment(&mut self) {
        self.count += 1;
    }
}

/// Display ordering of tally output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TallyOrder {
    /// First-seen order.
    Unsorted,
    /// Highest count first.
    #[default]
    Descending,
    /// Lowest count first.
    Ascending,
}

/// Outcome of counting one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TallyStep {
    /// Identifier tokens counted in the file.
    pub tokens: usize,
    /// Entries created for identifiers not seen before.
    pub new_entries: usize,
}

/// Owner of the identifier-to-count mapping for one tally pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyEngine {
    entries: IndexMap<GlobalId, TallyEntry>,
}

impl TallyEngine {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every identifier token of one file's text.
    pub fn count(
        &mut self,
        catalog: &dyn AssetCatalog,
        entry: &CorpusEntry,
        text: &str,
    ) -> TallyStep {
        let mut step = TallyStep::default();
        for (_, token) in scan::find_global_ids(text) {
            let Some(global_id) = GlobalId::parse(token) else {
                continue;
            };
            let tally = self.entries.entry(global_id).or_insert_with_key(|id| {
                step.new_entries += 1;
                TallyEntry::resolve(id.clone(), catalog)
            });
            tally.increment();
            step.tokens += 1;
        }
        log::debug!(
            "Counted {} identifiers in {} ({} new)",
            step.tokens,
            entry.path.display(),
            step.new_entries
        );
        step
    }

    /// Entry for one identifier.
    pub fn get(&self, global_id: &GlobalId) -> Option<&TallyEntry> {
        self.entries.get(global_id)
    }

    /// Every entry, valid or not, in first-seen order.
    pub fn entries(&self) -> &IndexMap<GlobalId, TallyEntry> {
        &self.entries
    }

    /// Number of distinct identifiers seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before anything was counted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Valid entries in display order. Sorting is stable, so equal counts
    /// keep their first-seen order.
    pub fn ranked(&self, order: TallyOrder) -> Vec<&TallyEntry> {
        let mut ranked: Vec<&TallyEntry> = self.entries.values().filter(|e| e.valid).collect();
        match order {
            TallyOrder::Unsorted => {}
            TallyOrder::Descending => ranked.sort_by(|a, b| b.count.cmp(&a.count)),
            TallyOrder::Ascending => ranked.sort_by(|a, b| a.count.cmp(&b.count)),
        }
        ranked
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
