//! Identifier patterns and position helpers.

use crate::model::GLOBAL_ID_LEN;
use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;

/// Maximal runs of identifier characters at least one identifier long.
///
/// The regex is leftmost-greedy, so every match is a whole run bounded by
/// non-identifier characters (or the ends of the text). Runs of any length
/// other than exactly [`GLOBAL_ID_LEN`] are rejected by [`find_global_ids`],
/// which keeps a 40-character hash from yielding a false 32-character hit.
static GLOBAL_ID_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9a-z]{32,}").expect("static pattern compiles"));

/// Every exact-length global identifier in `text`, as `(offset, token)`.
pub fn find_global_ids(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    GLOBAL_ID_RUN
        .find_iter(text)
        .filter(|m| m.len() == GLOBAL_ID_LEN)
        .map(|m| (m.start(), m.as_str()))
}

/// Positions where `local_id` appears as a reference.
///
/// A match must stand alone: the characters around it may not extend the
/// number (`100` does not match inside `1000` or `-100`), and the document's
/// own `&id` anchor is not a reference.
pub fn find_local_id<'t>(text: &'t str, local_id: &'t str) -> impl Iterator<Item = usize> + 't {
    let bytes = text.as_bytes();
    super::find_token(text, local_id).filter(move |&pos| {
        let before = pos.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(pos + local_id.len()).copied();
        let extends = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        !matches!(before, Some(b) if extends(b) || b == b'-' || b == b'&')
            && !matches!(after, Some(b) if extends(b))
    })
}

/// Byte offset to line/column conversion for one file.
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Index `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// 1-based line and 0-based byte column of `byte`.
    pub fn position(&self, byte: usize) -> (usize, usize) {
        let byte = byte.min(self.rope.len_bytes());
        let line = self.rope.byte_to_line(byte);
        let column = byte - self.rope.line_to_byte(line);
        (line + 1, column)
    }
}
