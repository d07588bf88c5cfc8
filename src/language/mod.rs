//! Language registry and the services shared by every walker.
//!
//! Each language implements [`Language`]: a tree-sitter grammar, the
//! file extensions it claims, a keyword list for the symbol filter,
//! and an `extract` pass that walks the syntax tree and emits
//! [`SymbolRecord`]s into an [`Emitter`].
//!
//! Dispatch inside the walkers is integer-based: every salient node
//! kind name is interned once per language into a `u16` id (via
//! `Language::id_for_node_kind`) and held behind a `OnceLock`. Unknown
//! kind names intern to 0, which no real node carries, so they simply
//! never match.

use std::path::Path;

use anyhow::{bail, Result};
use tree_sitter::{Node, Parser, Tree};

use crate::extract::{bounded, words_with_offsets};
use crate::filter::{clean_string_symbol, SymbolFilter};
use crate::models::{SymbolContext, SymbolRecord};

mod javascript;
mod php;
mod python;
mod typescript;

/// A parsed source file, owned for the duration of one extraction.
pub struct ParsedSource {
    pub tree: Tree,
    pub source: String,
    /// Full file name, extension included.
    pub filename: String,
    /// File stem, used for the per-file filename token and for
    /// module-path namespaces.
    pub stem: String,
    /// Directory prefix of the file (trailing slash, empty at root).
    pub directory: String,
}

impl ParsedSource {
    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

/// One supported language.
pub trait Language: Sync + Send {
    /// Stable identifier (e.g. "python").
    fn id(&self) -> &'static str;

    /// File extensions (without dots) this language claims.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Contents of this language's keyword list.
    fn keyword_list(&self) -> &'static str;

    /// Path globs that are never worth indexing for this language.
    fn ignore_globs(&self) -> &'static [&'static str] {
        &[]
    }

    fn grammar(&self) -> tree_sitter::Language;

    /// Grammar to use for a specific file. Languages with dialect
    /// grammars (TypeScript vs TSX) pick by extension.
    fn grammar_for(&self, _filename: &str) -> tree_sitter::Language {
        self.grammar()
    }

    /// Walk the tree and emit symbol records.
    fn extract(&self, file: &ParsedSource, out: &mut Emitter<'_>) -> Result<()>;
}

/// Parse a file into a [`ParsedSource`], or fail if the grammar
/// rejects it. The parser instance is scoped to this call.
pub fn parse_source(
    language: &dyn Language,
    source: String,
    directory: &str,
    filename: &str,
) -> Result<ParsedSource> {
    let mut parser = Parser::new();
    parser.set_language(&language.grammar_for(filename))?;

    let Some(tree) = parser.parse(&source, None) else {
        bail!("{} parser produced no tree", language.id());
    };
    if tree.root_node().has_error() {
        bail!("{} grammar rejected the file", language.id());
    }

    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
        .to_string();

    Ok(ParsedSource {
        tree,
        source,
        filename: filename.to_string(),
        stem,
        directory: directory.to_string(),
    })
}

/// Per-file record buffer plus the filter gate.
///
/// Walkers either `push` (structural rows that deliberately bypass the
/// filter: definition names, call-site arguments, the filename token)
/// or `push_filtered`/`push_words` (everything else).
pub struct Emitter<'a> {
    filter: &'a SymbolFilter,
    records: Vec<SymbolRecord>,
}

impl<'a> Emitter<'a> {
    pub fn new(filter: &'a SymbolFilter) -> Emitter<'a> {
        Emitter {
            filter,
            records: Vec::new(),
        }
    }

    /// Emit unconditionally.
    pub fn push(&mut self, record: SymbolRecord) {
        if !record.full_symbol.is_empty() {
            self.records.push(record);
        }
    }

    /// Emit only if the symbol passes the filter cascade.
    pub fn push_filtered(&mut self, record: SymbolRecord) {
        if self.filter.should_index(&record.symbol) {
            self.push(record);
        }
    }

    /// Split free text (a comment or string literal body) into words,
    /// clean each one, and emit the survivors.
    pub fn push_words(
        &mut self,
        text: &str,
        start_line: u32,
        context: SymbolContext,
        clue: &str,
        namespace: &str,
    ) {
        for (offset, raw) in words_with_offsets(text) {
            let word = clean_string_symbol(bounded(raw));
            if word.is_empty() || !self.filter.should_index(word) {
                continue;
            }
            let record = SymbolRecord::new(start_line + offset, word, context)
                .with_clue(clue)
                .with_namespace(namespace);
            self.push(record);
        }
    }

    /// Once per file: the filename stem as a searchable token.
    pub fn push_filename_token(&mut self, stem: &str) {
        // Structural row; bypasses the filter.
        self.push(SymbolRecord::new(1, stem, SymbolContext::Filename));
    }

    pub fn into_records(self) -> Vec<SymbolRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Walk up from `node` until the first ancestor whose kind id is in
/// `kinds`. Used to compute the `parent` of methods, properties,
/// parameters, and enum cases.
pub(crate) fn enclosing_named<'a>(node: Node<'a>, kinds: &[u16]) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if kinds.contains(&ancestor.kind_id()) {
            return Some(ancestor);
        }
        current = ancestor.parent();
    }
    None
}

/// Text of a node's `name` field, bounded.
pub(crate) fn name_of<'a>(node: Node<'a>, source: &'a [u8]) -> Option<&'a str> {
    let name = node.child_by_field_name("name")?;
    let text = crate::extract::node_text(name, source);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// All statically-registered languages. New languages are added here.
static LANGUAGES: [&'static dyn Language; 4] = [
    &python::PYTHON,
    &php::PHP,
    &typescript::TYPESCRIPT,
    &javascript::JAVASCRIPT,
];

pub fn all_languages() -> &'static [&'static dyn Language] {
    &LANGUAGES
}

/// Look up a language by file path, case-insensitively on the
/// extension.
pub fn language_for_path(path: &Path) -> Option<&'static dyn Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    LANGUAGES.iter().copied().find(|language| {
        language
            .file_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
    })
}

/// Every extension claimed by some language.
pub fn known_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = LANGUAGES
        .iter()
        .flat_map(|language| language.file_extensions().iter().copied())
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    extensions
}

/// Keyword lists of every language, for the query tool's diagnostics
/// filter.
pub fn all_keyword_lists() -> Vec<&'static str> {
    LANGUAGES
        .iter()
        .map(|language| language.keyword_list())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn registry_maps_extensions_to_languages() {
        let cases = [
            ("src/app.py", "python"),
            ("src/Index.php", "php"),
            ("src/app.ts", "typescript"),
            ("src/app.tsx", "typescript"),
            ("src/app.js", "javascript"),
            ("src/app.mjs", "javascript"),
        ];
        for (path, id) in cases {
            let language = language_for_path(&PathBuf::from(path)).expect(path);
            assert_eq!(language.id(), id);
        }
        assert!(language_for_path(&PathBuf::from("notes.txt")).is_none());
    }

    #[test]
    fn known_extensions_are_deduplicated() {
        let extensions = known_extensions();
        let mut sorted = extensions.clone();
        sorted.dedup();
        assert_eq!(extensions, sorted);
        assert!(extensions.contains(&"py"));
        assert!(extensions.contains(&"php"));
    }

    #[test]
    fn emitter_filters_words_but_not_structural_rows() {
        let filter = SymbolFilter::new(&["def\n"]).expect("filter");
        let mut emitter = Emitter::new(&filter);

        // Definition names bypass the filter even when they collide
        // with a keyword.
        emitter.push(SymbolRecord::new(1, "def", SymbolContext::Function));
        assert_eq!(emitter.len(), 1);

        emitter.push_filtered(SymbolRecord::new(2, "def", SymbolContext::Variable));
        assert_eq!(emitter.len(), 1);

        emitter.push_words("checks the token cache", 3, SymbolContext::Comment, "", "");
        let records = emitter.into_records();
        let words: Vec<&str> = records[1..].iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(words, vec!["checks", "token", "cache"]);
    }
}
