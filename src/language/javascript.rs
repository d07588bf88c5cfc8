//! JavaScript symbol extraction (JSX included, via the grammar's
//! native JSX support).
//!
//! The JavaScript grammar is the untyped subset of the TypeScript
//! dialect family, so extraction reuses the shared walker from the
//! TypeScript module with a kind table interned from the JavaScript
//! grammar: type-system kinds intern to 0 there and simply never
//! match.

use std::sync::OnceLock;

use anyhow::Result;

use crate::language::typescript::{intern_kinds, Kinds, Walker};
use crate::language::{Emitter, Language, ParsedSource};

pub struct JavaScriptLanguage;

pub static JAVASCRIPT: JavaScriptLanguage = JavaScriptLanguage;

static KEYWORDS: &str = include_str!("../../data/javascript_keywords.txt");

impl Language for JavaScriptLanguage {
    fn id(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn keyword_list(&self) -> &'static str {
        KEYWORDS
    }

    fn ignore_globs(&self) -> &'static [&'static str] {
        &[
            "**/node_modules/**",
            "**/dist/**",
            "**/build/**",
            "**/coverage/**",
            "**/*.min.js",
        ]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn extract(&self, file: &ParsedSource, out: &mut Emitter<'_>) -> Result<()> {
        let mut walker = Walker {
            kinds: js_kinds(&self.grammar()),
            src: file.bytes(),
            out,
            namespace: String::new(),
        };
        walker.walk(file.tree.root_node());
        Ok(())
    }
}

fn js_kinds(grammar: &tree_sitter::Language) -> &'static Kinds {
    static KINDS: OnceLock<Kinds> = OnceLock::new();
    KINDS.get_or_init(|| intern_kinds(grammar))
}
