//! symdex: a multi-language source-code indexer and query engine.
//!
//! The `symdex` binary walks source trees, parses each file with a
//! tree-sitter grammar, extracts atomic lexical symbols with rich
//! metadata, and writes rows into a SQLite index. The companion `qi`
//! binary reads that index and answers structured queries: wildcard
//! symbol match, context-kind filters, file globs, proximity
//! co-occurrence, scoped search inside a named definition, literal
//! source expansion, and grep-style context windows.

pub mod cli;
pub mod extract;
pub mod filter;
pub mod index;
pub mod language;
pub mod models;
pub mod query;
