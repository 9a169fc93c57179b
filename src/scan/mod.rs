//! Line-based scanner for the document-stream serialization dialect.
//!
//! A file is a sequence of documents, each opened by a separator line such as
//! `--- !u!114 &200` and followed by a type line (`MonoBehaviour:`). Field
//! lines sit exactly one indent unit deeper than the type line; anything
//! deeper is a continuation of the previous field and is kept verbatim.
//!
//! This is deliberately not a YAML parser. It recovers just enough structure
//! (boundaries, types, local ids, top-level fields) to attribute identifier
//! hits to the document that contains them.

pub mod pattern;

pub use pattern::{find_global_ids, find_local_id, LineIndex};

use crate::error::ScanAnomaly;
use crate::model::{LocalId, TypeTag};
use indexmap::IndexMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Prefix of every document separator line.
pub const DOCUMENT_MARKER: &str = "--- !u!";

/// Default width of one indentation level.
pub const DEFAULT_INDENT_UNIT: usize = 2;

/// One embedded document recovered from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// The document's `&id` anchor.
    pub local_id: LocalId,
    /// Numeric class discriminator from the separator (`114` in `!u!114`).
    pub class_id: String,
    /// Type named on the first line of the document body.
    pub type_tag: TypeTag,
    /// Top-level fields in file order. Values are the raw text after the
    /// colon, with continuation lines appended after a newline.
    pub fields: IndexMap<String, String>,
    /// File the document was scanned from, when known.
    pub source_file: Option<PathBuf>,
    /// Byte range of the document, separator line included.
    pub byte_range: Range<usize>,
    /// Separator carried the `stripped` marker.
    pub stripped: bool,
    /// Non-fatal oddities found while scanning this document.
    pub anomalies: Vec<ScanAnomaly>,
}

impl DocumentRecord {
    /// Raw text of a field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// True if any field value contains `needle`.
    pub fn fields_contain(&self, needle: &str) -> bool {
        self.fields.values().any(|value| value.contains(needle))
    }

    /// True if `pos` falls inside this document.
    pub fn contains_position(&self, pos: usize) -> bool {
        self.byte_range.contains(&pos)
    }
}

/// Scan `text` into its documents.
///
/// Records surface lazily: each is produced once the next separator (or end
/// of input) is reached. Text before the first separator belongs to no
/// document and is skipped.
pub fn scan(text: &str) -> Documents<'_> {
    Documents::new(text)
}

/// Lazy iterator over the documents of one file.
#[derive(Debug, Clone)]
pub struct Documents<'t> {
    text: &'t str,
    pos: usize,
    line: usize,
    indent_unit: usize,
    source_file: Option<PathBuf>,
}

impl<'t> Documents<'t> {
    /// Start scanning `text` from the beginning.
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            indent_unit: DEFAULT_INDENT_UNIT,
            source_file: None,
        }
    }

    /// Use a different indentation width for field lines.
    pub fn with_indent_unit(mut self, indent_unit: usize) -> Self {
        self.indent_unit = indent_unit.max(1);
        self
    }

    /// Tag every produced record with its source file.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source_file = Some(path.to_path_buf());
        self
    }

    /// Read the line at the cursor, returning it without its terminator and
    /// the offset of the following line.
    fn current_line(&self) -> (&'t str, usize) {
        let rest = &self.text[self.pos..];
        match rest.find('\n') {
            Some(idx) => (&rest[..idx], self.pos + idx + 1),
            None => (rest, self.text.len()),
        }
    }

    fn advance(&mut self, next: usize) {
        self.pos = next;
        self.line += 1;
    }
}

impl Iterator for Documents<'_> {
    type Item = DocumentRecord;

    fn next(&mut self) -> Option<DocumentRecord> {
        // Seek the next separator; anything before it is unattributed.
        let (header, start) = loop {
            if self.pos >= self.text.len() {
                return None;
            }
            let (line, next) = self.current_line();
            let start = self.pos;
            self.advance(next);
            if let Some(header) = parse_header(line) {
                break (header, start);
            }
        };

        let mut builder = DocumentBuilder::new(header, self.indent_unit);
        while self.pos < self.text.len() {
            let (line, next) = self.current_line();
            if parse_header(line).is_some() {
                break;
            }
            builder.push_line(line, self.line);
            self.advance(next);
        }

        Some(builder.finish(start..self.pos, self.source_file.clone()))
    }
}

/// Parsed separator line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    class_id: String,
    local_id: LocalId,
    stripped: bool,
}

/// Parse `--- !u!<class> &<id> [stripped]`.
fn parse_header(line: &str) -> Option<Header> {
    let rest = line.trim_end_matches('\r').strip_prefix(DOCUMENT_MARKER)?;
    let mut parts = rest.split_whitespace();
    let class_id = parts.next()?.to_string();
    let local_id = parts.next()?.strip_prefix('&')?;
    if local_id.is_empty() {
        return None;
    }
    let stripped = parts.any(|p| p == "stripped");
    Some(Header {
        class_id,
        local_id: LocalId::new(local_id),
        stripped,
    })
}

/// Count leading whitespace; tabs and spaces each count as one.
pub fn indentation(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Accumulates one document's lines into a record.
struct DocumentBuilder {
    header: Header,
    indent_unit: usize,
    type_tag: Option<TypeTag>,
    fields: IndexMap<String, String>,
    last_field: Option<String>,
    anomalies: Vec<ScanAnomaly>,
}

impl DocumentBuilder {
    fn new(header: Header, indent_unit: usize) -> Self {
        Self {
            header,
            indent_unit,
            type_tag: None,
            fields: IndexMap::new(),
            last_field: None,
            anomalies: Vec::new(),
        }
    }

    fn push_line(&mut self, raw: &str, line_number: usize) {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            return;
        }

        let indent = indentation(line);
        if self.type_tag.is_none() && indent == 0 {
            let name = line.trim().trim_end_matches(':').trim();
            self.type_tag = Some(TypeTag::new(name));
            return;
        }

        let body = &line[indent..];
        if indent == self.indent_unit && !body.starts_with('-') {
            if let Some((name, value)) = body.split_once(':') {
                self.insert_field(name.trim(), value.trim(), line_number);
                return;
            }
        }

        if indent >= self.indent_unit {
            self.append_continuation(line);
        }
    }

    fn insert_field(&mut self, name: &str, value: &str, line_number: usize) {
        if self.fields.contains_key(name) {
            let anomaly = ScanAnomaly::DuplicateField {
                local_id: self.header.local_id.to_string(),
                field: name.to_string(),
                line: line_number,
            };
            log::warn!("{}", anomaly);
            self.anomalies.push(anomaly);
        }
        self.fields.insert(name.to_string(), value.to_string());
        self.last_field = Some(name.to_string());
    }

    fn append_continuation(&mut self, line: &str) {
        let Some(field) = self.last_field.as_ref() else {
            return;
        };
        if let Some(value) = self.fields.get_mut(field) {
            value.push('\n');
            value.push_str(line);
        }
    }

    fn finish(self, byte_range: Range<usize>, source_file: Option<PathBuf>) -> DocumentRecord {
        DocumentRecord {
            local_id: self.header.local_id,
            class_id: self.header.class_id,
            type_tag: self.type_tag.unwrap_or_else(|| TypeTag::new("")),
            fields: self.fields,
            source_file,
            byte_range,
            stripped: self.header.stripped,
            anomalies: self.anomalies,
        }
    }
}

/// Raw, structure-independent substring search.
///
/// Yields the byte offset of every non-overlapping occurrence of `token`.
/// An empty token yields nothing.
pub fn find_token<'t>(text: &'t str, token: &'t str) -> FindToken<'t> {
    FindToken {
        text,
        token,
        cursor: 0,
    }
}

/// Iterator returned by [`find_token`].
#[derive(Debug, Clone)]
pub struct FindToken<'t> {
    text: &'t str,
    token: &'t str,
    cursor: usize,
}

impl Iterator for FindToken<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.token.is_empty() || self.cursor > self.text.len() {
            return None;
        }
        let found = self.text[self.cursor..].find(self.token)?;
        let pos = self.cursor + found;
        self.cursor = pos + self.token.len();
        Some(pos)
    }
}

/// Find the document whose byte range covers `pos`.
///
/// `documents` must be in file order, as [`scan`] produces them. Positions
/// before the first document are unattributed and return `None`.
pub fn containing_document(documents: &[DocumentRecord], pos: usize) -> Option<&DocumentRecord> {
    let idx = documents.partition_point(|doc| doc.byte_range.start <= pos);
    let doc = documents.get(idx.checked_sub(1)?)?;
    doc.contains_position(pos).then_some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"%YAML 1.1
%TAG !u! tag:unity3d.com,2011:
--- !u!1 &100
GameObject:
  m_ObjectHideFlags: 0
  m_Component:
  - component: {fileID: 200}
  - component: {fileID: 300}
  m_Name: Player
--- !u!114 &200
MonoBehaviour:
  m_GameObject: {fileID: 100}
  m_Script: {fileID: 11500000, guid: 0123456789abcdef0123456789abcdef, type: 3}
  speed: 4
--- !u!4 &300 stripped
Transform:
  m_Children: []
"#;

    #[test]
    fn test_scan_documents() {
        let docs: Vec<_> = scan(SCENE).collect();
        assert_eq!(docs.len(), 3);

        assert_eq!(docs[0].local_id.as_str(), "100");
        assert_eq!(docs[0].class_id, "1");
        assert_eq!(docs[0].type_tag.as_str(), "GameObject");
        assert_eq!(docs[0].field("m_Name"), Some("Player"));
        assert_eq!(
            docs[0].field("m_Component"),
            Some("\n  - component: {fileID: 200}\n  - component: {fileID: 300}")
        );

        assert_eq!(docs[1].type_tag.as_str(), "MonoBehaviour");
        assert!(docs[1].field("m_Script").unwrap().contains("guid: 0123456789abcdef"));
        assert!(docs[2].stripped);
    }

    #[test]
    fn test_byte_ranges_partition_the_file() {
        let docs: Vec<_> = scan(SCENE).collect();
        assert_eq!(&SCENE[docs[0].byte_range.start..][..7], DOCUMENT_MARKER);
        assert_eq!(docs[0].byte_range.end, docs[1].byte_range.start);
        assert_eq!(docs[1].byte_range.end, docs[2].byte_range.start);
        assert_eq!(docs[2].byte_range.end, SCENE.len());
    }

    #[test]
    fn test_duplicate_field_is_reported_not_fatal() {
        let text = "--- !u!1 &7\nGameObject:\n  m_Name: A\n  m_Name: B\n  m_Layer: 0\n";
        let docs: Vec<_> = scan(text).collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].field("m_Name"), Some("B"));
        assert_eq!(docs[0].field("m_Layer"), Some("0"));
        assert_eq!(
            docs[0].anomalies,
            vec![ScanAnomaly::DuplicateField {
                local_id: "7".to_string(),
                field: "m_Name".to_string(),
                line: 4,
            }]
        );
    }

    #[test]
    fn test_tabs_count_as_one_indent_character() {
        let text = "--- !u!1 &1\nGameObject:\n\t\tm_Name: Tabbed\n\t\t\tdeeper\n";
        let docs: Vec<_> = scan(text).collect();
        assert_eq!(docs[0].field("m_Name"), Some("Tabbed\n\t\t\tdeeper"));
    }

    #[test]
    fn test_custom_indent_unit() {
        let text = "--- !u!1 &1\nGameObject:\n    m_Name: Wide\n      nested: 1\n";
        let docs: Vec<_> = Documents::new(text).with_indent_unit(4).collect();
        assert_eq!(docs[0].field("m_Name"), Some("Wide\n      nested: 1"));
    }

    #[test]
    fn test_crlf_lines() {
        let text = "--- !u!1 &1\r\nGameObject:\r\n  m_Name: Win\r\n";
        let docs: Vec<_> = scan(text).collect();
        assert_eq!(docs[0].type_tag.as_str(), "GameObject");
        assert_eq!(docs[0].field("m_Name"), Some("Win"));
    }

    #[test]
    fn test_find_token_non_overlapping() {
        let positions: Vec<_> = find_token("aaaa", "aa").collect();
        assert_eq!(positions, vec![0, 2]);
        assert_eq!(find_token("abc", "").count(), 0);
        assert_eq!(find_token("abc", "z").count(), 0);
    }

    #[test]
    fn test_containing_document() {
        let docs: Vec<_> = scan(SCENE).collect();
        let before = SCENE.find("%TAG").unwrap();
        assert!(containing_document(&docs, before).is_none());

        let in_second = SCENE.find("speed").unwrap();
        assert_eq!(
            containing_document(&docs, in_second).map(|d| d.local_id.as_str()),
            Some("200")
        );

        let in_continuation = SCENE.find("fileID: 300").unwrap();
        assert_eq!(
            containing_document(&docs, in_continuation).map(|d| d.local_id.as_str()),
            Some("100")
        );
    }

    #[test]
    fn test_source_file_is_attached() {
        let docs: Vec<_> = scan(SCENE).with_source(Path::new("Assets/Main.unity")).collect();
        assert!(docs
            .iter()
            .all(|d| d.source_file.as_deref() == Some(Path::new("Assets/Main.unity"))));
    }
}
