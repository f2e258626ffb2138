//! Key/value text block codec for the entity editor.
//!
//! The editor pane shows one `key=value` pair per line; this module
//! converts between that text and the entity mapping. Rendering is
//! deterministic (keys in ascending order) so the same mapping always
//! produces the same block.

use std::collections::BTreeMap;

/// Line separator used when rendering. The scratch format travels through
/// edit controls that expect CRLF, so it is fixed rather than
/// platform-dependent.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Render a mapping as a `key=value` text block.
///
/// Keys appear in ascending lexicographic order, one pair per line,
/// joined by [`LINE_SEPARATOR`]. An empty mapping renders to empty text.
pub fn render(mapping: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in mapping.iter().enumerate() {
        if i > 0 {
            out.push_str(LINE_SEPARATOR);
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Parse a `key=value` text block into a mapping.
///
/// Accepts both LF and CRLF line endings. Lines are trimmed, blank lines
/// skipped, and each line is split on the *first* `=` so values may
/// contain `=`. The last occurrence of a duplicate key wins. Lines
/// without `=` are dropped.
pub fn parse(text: &str) -> BTreeMap<String, String> {
    parse_with_skipped(text).0
}

/// Like [`parse`], but also reports how many non-blank lines were dropped
/// for lacking a `=` separator.
pub fn parse_with_skipped(text: &str) -> (BTreeMap<String, String>, usize) {
    let mut mapping = BTreeMap::new();
    let mut skipped = 0;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                mapping.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => skipped += 1,
        }
    }

    (mapping, skipped)
}
