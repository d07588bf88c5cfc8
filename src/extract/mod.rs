//! Extraction primitives shared by every language walker: bounded node
//! text, location formatting, comment stripping, word splitting, and
//! project-relative path canonicalization.

use std::path::Path;

use tree_sitter::Node;

use crate::models::{SourceLocation, MAX_SYMBOL_LEN};

/// Safe substring of a node, capped at [`MAX_SYMBOL_LEN`] bytes on a
/// character boundary. Invalid UTF-8 yields the empty string.
pub fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    bounded(node.utf8_text(source).unwrap_or(""))
}

/// Truncate `text` to the per-symbol maximum without splitting a
/// character.
pub fn bounded(text: &str) -> &str {
    if text.len() <= MAX_SYMBOL_LEN {
        return text;
    }
    let mut end = MAX_SYMBOL_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// 1-based line of a node's first byte.
pub fn node_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Location of a node: 1-based lines, 0-based byte columns, end
/// exclusive.
pub fn node_location(node: Node) -> SourceLocation {
    let start = node.start_position();
    let end = node.end_position();
    SourceLocation {
        start_line: start.row as u32 + 1,
        start_column: start.column as u32,
        end_line: end.row as u32 + 1,
        end_column: end.column as u32,
    }
}

/// Split an absolute file path into the `(directory, filename)` pair
/// stored in the index, relative to `root`.
///
/// The directory uses forward slashes and ends in `/`; files directly
/// under the root get an empty directory. Paths outside the root
/// return `None`.
pub fn split_relative(root: &Path, path: &Path) -> Option<(String, String)> {
    let relative = path.strip_prefix(root).ok()?;
    let filename = relative.file_name()?.to_string_lossy().into_owned();

    let mut directory = String::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            let part = component.as_os_str().to_string_lossy();
            if part.is_empty() || part == "." {
                continue;
            }
            directory.push_str(&part);
            directory.push('/');
        }
    }

    Some((directory, filename))
}

/// Remove comment delimiters from a comment node's text, line by line,
/// leaving only the prose. Handles `//`, `#`, `/* ... */`, and the
/// decorative `*` gutter of block comments.
pub fn strip_comment_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        let mut body = line.trim();
        for prefix in ["/**", "/*", "//", "#"] {
            if let Some(rest) = body.strip_prefix(prefix) {
                body = rest;
                break;
            }
        }
        body = body.trim_start_matches('*');
        if let Some(rest) = body.strip_suffix("*/") {
            body = rest;
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(body.trim());
    }
    out
}

/// Split multi-line text into whitespace-separated words, yielding the
/// 0-based line offset of each word relative to the text's first line.
pub fn words_with_offsets(text: &str) -> impl Iterator<Item = (u32, &str)> {
    text.lines()
        .enumerate()
        .flat_map(|(offset, line)| line.split_whitespace().map(move |w| (offset as u32, w)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn bounded_respects_char_boundaries() {
        let short = "abc";
        assert_eq!(bounded(short), "abc");

        let long = "é".repeat(MAX_SYMBOL_LEN);
        let cut = bounded(&long);
        assert!(cut.len() <= MAX_SYMBOL_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn split_relative_builds_directory_with_trailing_slash() {
        let root = PathBuf::from("/project");

        let (dir, name) = split_relative(&root, Path::new("/project/src/auth/login.py")).unwrap();
        assert_eq!(dir, "src/auth/");
        assert_eq!(name, "login.py");

        let (dir, name) = split_relative(&root, Path::new("/project/main.py")).unwrap();
        assert_eq!(dir, "");
        assert_eq!(name, "main.py");

        assert!(split_relative(&root, Path::new("/elsewhere/x.py")).is_none());
    }

    #[test]
    fn strip_comment_markers_handles_each_style() {
        assert_eq!(strip_comment_markers("// line comment"), "line comment");
        assert_eq!(strip_comment_markers("# hash comment"), "hash comment");
        assert_eq!(
            strip_comment_markers("/* block\n * gutter\n */"),
            "block\ngutter\n"
        );
        assert_eq!(strip_comment_markers("/** doc */"), "doc");
    }

    #[test]
    fn words_track_their_line_offsets() {
        let words: Vec<(u32, &str)> = words_with_offsets("alpha beta\n\ngamma").collect();
        assert_eq!(words, vec![(0, "alpha"), (0, "beta"), (2, "gamma")]);
    }
}
