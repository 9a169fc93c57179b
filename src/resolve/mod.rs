//! Two-tier reference resolution.
//!
//! Global tier: every exact occurrence of the target's [`GlobalId`] is
//! attributed to the document that contains it. Those documents are the
//! *roots* of the reference.
//!
//! Local tier: inside the same file, every standalone occurrence of a root's
//! [`LocalId`] is a local reference to it. A hit inside the root itself is a
//! same-document reference; a hit inside another document makes that
//! document a *referrer*, i.e. an object that reaches the target through the
//! root rather than by naming it.
//!
//! Local ids are only ever compared against documents of the file they were
//! scanned from.

pub mod result;

pub use result::{AssetResult, ResultDetail};

use crate::catalog::AssetCatalog;
use crate::corpus::CorpusEntry;
use crate::model::{GlobalId, LocalId, ObjectHandle, TypeTag};
use crate::scan::{self, DocumentRecord, LineIndex, DEFAULT_INDENT_UNIT};
use serde::Serialize;

/// Name of the field that binds a behaviour document to its script.
pub const SCRIPT_FIELD: &str = "m_Script";

/// How a hit relates to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    /// The target's global identifier itself.
    GlobalReference,
    /// A root's local id inside the root document.
    SameDocumentLocal,
    /// A root's local id inside another document of the same file.
    CrossDocumentLocal,
}

impl HitKind {
    /// True for either local tier.
    pub fn is_local(self) -> bool {
        !matches!(self, HitKind::GlobalReference)
    }
}

/// One attributed textual occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceHit {
    /// Byte offset in the file.
    pub position: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (0-based, in bytes).
    pub column: usize,
    /// Document that contains the occurrence.
    pub containing_document: LocalId,
    /// The matched text.
    pub matched_token: String,
    /// Tier and relation of the hit.
    pub kind: HitKind,
}

/// Hits of one file together with the documents they point at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHits {
    /// Hits in discovery order: global hits first, then local hits per root.
    pub hits: Vec<ReferenceHit>,
    /// Documents that name the target, in first-seen order.
    pub roots: Vec<LocalId>,
    /// Documents that reference a root from elsewhere in the file.
    pub referrers: Vec<LocalId>,
    /// True if the target occurs in the file at all, attributed or not.
    pub mentioned: bool,
}

impl FileHits {
    /// Roots followed by referrers: every document involved in the reference.
    pub fn involved(&self) -> impl Iterator<Item = &LocalId> {
        self.roots.iter().chain(self.referrers.iter())
    }
}

/// Find the global and local hits of `target` in one file.
///
/// `documents` must be the scan of `text`. Occurrences outside every
/// document are unattributed and dropped, although they still mark the file
/// as mentioning the target.
pub fn find_hits(text: &str, documents: &[DocumentRecord], target: &GlobalId) -> FileHits {
    let lines = LineIndex::new(text);
    let mut found = FileHits::default();

    for (position, token) in scan::find_global_ids(text) {
        if token != target.as_str() {
            continue;
        }
        found.mentioned = true;
        let Some(document) = scan::containing_document(documents, position) else {
            log::debug!("Unattributed occurrence of {} at byte {}", target, position);
            continue;
        };
        if !found.roots.contains(&document.local_id) {
            found.roots.push(document.local_id.clone());
        }
        found.hits.push(hit(&lines, position, document, token, HitKind::GlobalReference));
    }

    for root in found.roots.clone() {
        for position in scan::find_local_id(text, root.as_str()) {
            let Some(document) = scan::containing_document(documents, position) else {
                continue;
            };
            if in_header_line(text, document, position) {
                continue;
            }
            let kind = if document.local_id == root {
                HitKind::SameDocumentLocal
            } else {
                HitKind::CrossDocumentLocal
            };
            if kind == HitKind::CrossDocumentLocal
                && !found.roots.contains(&document.local_id)
                && !found.referrers.contains(&document.local_id)
            {
                found.referrers.push(document.local_id.clone());
            }
            found.hits.push(hit(&lines, position, document, root.as_str(), kind));
        }
    }

    found
}

fn hit(
    lines: &LineIndex,
    position: usize,
    document: &DocumentRecord,
    token: &str,
    kind: HitKind,
) -> ReferenceHit {
    let (line, column) = lines.position(position);
    ReferenceHit {
        position,
        line,
        column,
        containing_document: document.local_id.clone(),
        matched_token: token.to_string(),
        kind,
    }
}

/// The separator line holds the class number and anchor, never a reference.
fn in_header_line(text: &str, document: &DocumentRecord, position: usize) -> bool {
    let start = document.byte_range.start;
    let header_end = text[start..]
        .find('\n')
        .map_or(document.byte_range.end, |idx| start + idx);
    position < header_end
}

/// Resolves files against one search target.
///
/// Holds no per-file state; every call to [`resolve_file`] is independent.
///
/// [`resolve_file`]: ReferenceResolver::resolve_file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceResolver {
    target: GlobalId,
    declared_type: TypeTag,
    indent_unit: usize,
}

impl ReferenceResolver {
    /// Resolver for the target with identifier `target` whose instances
    /// have type `declared_type`.
    pub fn new(target: GlobalId, declared_type: TypeTag) -> Self {
        Self {
            target,
            declared_type,
            indent_unit: DEFAULT_INDENT_UNIT,
        }
    }

    /// Scan with a non-default indentation width.
    pub fn with_indent_unit(mut self, indent_unit: usize) -> Self {
        self.indent_unit = indent_unit;
        self
    }

    /// The target identifier.
    pub fn target(&self) -> &GlobalId {
        &self.target
    }

    /// Type the target's instances declare.
    pub fn declared_type(&self) -> &TypeTag {
        &self.declared_type
    }

    /// Scan and resolve one file. `None` if the file does not reference the
    /// target.
    pub fn resolve_file(
        &self,
        catalog: &dyn AssetCatalog,
        entry: &CorpusEntry,
        text: &str,
    ) -> Option<(AssetResult, Vec<DocumentRecord>)> {
        // Cheap rejection before scanning.
        if !text.contains(self.target.as_str()) {
            return None;
        }
        let documents: Vec<DocumentRecord> = scan::scan(text)
            .with_indent_unit(self.indent_unit)
            .with_source(&entry.path)
            .collect();
        let found = find_hits(text, &documents, &self.target);
        if !found.mentioned {
            return None;
        }
        let result = self.resolve(catalog, entry, &documents, found);
        Some((result, documents))
    }

    /// Build the result for a file known to mention the target.
    pub fn resolve(
        &self,
        catalog: &dyn AssetCatalog,
        entry: &CorpusEntry,
        documents: &[DocumentRecord],
        found: FileHits,
    ) -> AssetResult {
        let mut result = AssetResult::new(&entry.path, entry.category, entry.type_tag.clone());
        result.object = catalog.load_object(&entry.path, &entry.type_tag);

        if entry.category.is_composite() {
            let members = self.sub_references(catalog, entry, documents, &found);
            match &mut result.detail {
                ResultDetail::Scene { sub_references } | ResultDetail::Prefab { sub_references } => {
                    *sub_references = members;
                }
                ResultDetail::Asset | ResultDetail::Script => {}
            }
        }

        result.hits = found.hits;
        result
    }

    fn sub_references(
        &self,
        catalog: &dyn AssetCatalog,
        entry: &CorpusEntry,
        documents: &[DocumentRecord],
        found: &FileHits,
    ) -> Vec<ObjectHandle> {
        let mut members: Vec<ObjectHandle> = Vec::new();
        let mut push = |handle: ObjectHandle| {
            if !members.contains(&handle) {
                members.push(handle);
            }
        };

        if let Some(hierarchy) = catalog.loaded_hierarchy(&entry.path) {
            // Assignability widens recall: with several components of the
            // target type on one object, all of them are reported.
            for component in hierarchy {
                let local_id = catalog.local_id(&component);
                if found.involved().any(|id| *id == local_id)
                    || catalog.is_assignable_from(&self.declared_type, &component.type_tag)
                {
                    push(component);
                }
            }
        } else {
            for local_id in found.involved() {
                let Some(document) = documents.iter().find(|d| &d.local_id == local_id) else {
                    continue;
                };
                let handle = script_object(catalog, document).unwrap_or_else(|| {
                    ObjectHandle::embedded(&entry.path, local_id.clone(), document.type_tag.clone())
                });
                push(handle);
            }
        }

        members
    }
}

/// Object named by a document's script field, if it resolves.
fn script_object(catalog: &dyn AssetCatalog, document: &DocumentRecord) -> Option<ObjectHandle> {
    let raw = document.field(SCRIPT_FIELD)?;
    let (_, token) = scan::find_global_ids(raw).next()?;
    catalog.object_for_global_id(&GlobalId::parse(token)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    const TARGET: &str = "abcdef0123456789abcdef0123456789";

    fn scene_text() -> String {
        format!(
            "%YAML 1.1\n\
             --- !u!1 &100\n\
             GameObject:\n  \
               m_Name: Spawner\n  \
               m_Prefab: {{fileID: 1, guid: {target}, type: 3}}\n\
             --- !u!114 &200\n\
             MonoBehaviour:\n  \
               m_GameObject: {{fileID: 100}}\n  \
               m_Enabled: 1\n\
             --- !u!4 &300\n\
             Transform:\n  \
               m_GameObject: {{fileID: 1000}}\n",
            target = TARGET
        )
    }

    fn target() -> GlobalId {
        GlobalId::parse(TARGET).unwrap()
    }

    #[test]
    fn test_find_hits_global_and_local() {
        let text = scene_text();
        let documents: Vec<_> = scan::scan(&text).collect();
        let found = find_hits(&text, &documents, &target());

        assert!(found.mentioned);
        assert_eq!(found.roots, vec![LocalId::new("100")]);
        assert_eq!(found.referrers, vec![LocalId::new("200")]);

        let kinds: Vec<_> = found.hits.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, vec![HitKind::GlobalReference, HitKind::CrossDocumentLocal]);

        let global = &found.hits[0];
        assert_eq!(global.containing_document.as_str(), "100");
        assert_eq!(global.line, 5);
        assert_eq!(global.matched_token, TARGET);
    }

    #[test]
    fn test_unattributed_occurrence_is_dropped() {
        let text = format!("# {}\n--- !u!1 &1\nGameObject:\n  m_Name: A\n", TARGET);
        let documents: Vec<_> = scan::scan(&text).collect();
        let found = find_hits(&text, &documents, &target());
        assert!(found.mentioned);
        assert!(found.hits.is_empty());
        assert!(found.roots.is_empty());
    }

    #[test]
    fn test_class_number_in_header_is_not_a_local_hit() {
        let text = format!(
            "--- !u!1 &4\nGameObject:\n  ref: {}\n--- !u!4 &9\nTransform:\n  m_Father: {{fileID: 4}}\n",
            TARGET
        );
        let documents: Vec<_> = scan::scan(&text).collect();
        let found = find_hits(&text, &documents, &target());
        let local: Vec<_> = found.hits.iter().filter(|h| h.kind.is_local()).collect();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].containing_document.as_str(), "9");
    }

    #[test]
    fn test_static_fallback_uses_script_field() {
        let script_guid = "11112222333344445555666677778888";
        let text = format!(
            "--- !u!114 &7\nMonoBehaviour:\n  m_Script: {{fileID: 11500000, guid: {}, type: 3}}\n  target: {{guid: {}}}\n",
            script_guid, TARGET
        );
        let mut catalog = crate::catalog::MemoryCatalog::new();
        catalog
            .add_file("Assets/Spawner.cs", "MonoScript", Some(script_guid), "")
            .add_file("Assets/Level.unity", "SceneAsset", None, text.clone());

        let entry = CorpusEntry {
            path: "Assets/Level.unity".into(),
            category: Category::Scene,
            type_tag: "SceneAsset".into(),
            size: text.len() as u64,
        };
        let resolver = ReferenceResolver::new(target(), "GameObject".into());
        let (result, _) = resolver.resolve_file(&catalog, &entry, &text).unwrap();
        assert_eq!(
            result.sub_references(),
            &[ObjectHandle::asset("Assets/Spawner.cs", "MonoScript")]
        );
    }

    #[test]
    fn test_superstring_only_is_not_a_result() {
        let text = format!("--- !u!1 &1\nGameObject:\n  hash: {}ffff\n", TARGET);
        let entry = CorpusEntry {
            path: "Assets/Data.asset".into(),
            category: Category::Asset,
            type_tag: "DefaultAsset".into(),
            size: 0,
        };
        let resolver = ReferenceResolver::new(target(), "GameObject".into());
        let catalog = crate::catalog::MemoryCatalog::new();
        assert!(resolver.resolve_file(&catalog, &entry, &text).is_none());
    }
}
