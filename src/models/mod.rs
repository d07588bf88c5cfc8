//! Shared data models for the index and the query planner.
//!
//! The central type is [`SymbolRecord`], the unit of both indexing and
//! querying. Records are produced by the language walkers, buffered per
//! file, and flushed into the `code_index` table in one transaction.

use std::fmt;

use anyhow::{bail, Result};

/// Hard cap on the length of any emitted text field, in bytes.
///
/// Walkers never copy more than this out of a parse buffer; longer
/// node text (deep member chains, huge annotations) is truncated at a
/// character boundary.
pub const MAX_SYMBOL_LEN: usize = 200;

/// How a symbol appears in source: declaration, reference, comment
/// word, and so on.
///
/// The compact code is what gets stored in the `context` column; the
/// expanded name is a display/input convenience. Both forms are
/// accepted wherever a kind is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolContext {
    Class,
    Interface,
    Function,
    Argument,
    Variable,
    Property,
    Type,
    Import,
    Export,
    Call,
    Lambda,
    Enum,
    Case,
    Namespace,
    Trait,
    Comment,
    String,
    Filename,
    Exception,
    Goto,
    Label,
}

/// Every context kind, in display order.
pub const ALL_CONTEXTS: &[SymbolContext] = &[
    SymbolContext::Class,
    SymbolContext::Interface,
    SymbolContext::Function,
    SymbolContext::Argument,
    SymbolContext::Variable,
    SymbolContext::Property,
    SymbolContext::Type,
    SymbolContext::Import,
    SymbolContext::Export,
    SymbolContext::Call,
    SymbolContext::Lambda,
    SymbolContext::Enum,
    SymbolContext::Case,
    SymbolContext::Namespace,
    SymbolContext::Trait,
    SymbolContext::Comment,
    SymbolContext::String,
    SymbolContext::Filename,
    SymbolContext::Exception,
    SymbolContext::Goto,
    SymbolContext::Label,
];

impl SymbolContext {
    /// Compact code stored in the `context` column.
    pub fn compact(self) -> &'static str {
        match self {
            SymbolContext::Class => "class",
            SymbolContext::Interface => "iface",
            SymbolContext::Function => "fn",
            SymbolContext::Argument => "arg",
            SymbolContext::Variable => "var",
            SymbolContext::Property => "prop",
            SymbolContext::Type => "type",
            SymbolContext::Import => "imp",
            SymbolContext::Export => "exp",
            SymbolContext::Call => "call",
            SymbolContext::Lambda => "lambda",
            SymbolContext::Enum => "enum",
            SymbolContext::Case => "case",
            SymbolContext::Namespace => "ns",
            SymbolContext::Trait => "trait",
            SymbolContext::Comment => "comment",
            SymbolContext::String => "str",
            SymbolContext::Filename => "file",
            SymbolContext::Exception => "exc",
            SymbolContext::Goto => "goto",
            SymbolContext::Label => "label",
        }
    }

    /// Long, human-facing name shown with `--full` and in `--list-types`.
    pub fn expanded(self) -> &'static str {
        match self {
            SymbolContext::Class => "class",
            SymbolContext::Interface => "interface",
            SymbolContext::Function => "function",
            SymbolContext::Argument => "argument",
            SymbolContext::Variable => "variable",
            SymbolContext::Property => "property",
            SymbolContext::Type => "type",
            SymbolContext::Import => "import",
            SymbolContext::Export => "export",
            SymbolContext::Call => "call",
            SymbolContext::Lambda => "lambda",
            SymbolContext::Enum => "enum",
            SymbolContext::Case => "case",
            SymbolContext::Namespace => "namespace",
            SymbolContext::Trait => "trait",
            SymbolContext::Comment => "comment",
            SymbolContext::String => "string",
            SymbolContext::Filename => "filename",
            SymbolContext::Exception => "exception",
            SymbolContext::Goto => "goto",
            SymbolContext::Label => "label",
        }
    }

    /// One-line description used by `--list-types`.
    pub fn describe(self) -> &'static str {
        match self {
            SymbolContext::Class => "class declaration",
            SymbolContext::Interface => "interface declaration",
            SymbolContext::Function => "function or method declaration",
            SymbolContext::Argument => "parameter or call-site argument",
            SymbolContext::Variable => "variable binding or constant",
            SymbolContext::Property => "property, field, or member access",
            SymbolContext::Type => "type annotation or base type",
            SymbolContext::Import => "imported name",
            SymbolContext::Export => "exported name",
            SymbolContext::Call => "call site",
            SymbolContext::Lambda => "anonymous function",
            SymbolContext::Enum => "enum declaration",
            SymbolContext::Case => "enum case",
            SymbolContext::Namespace => "namespace or module declaration",
            SymbolContext::Trait => "trait declaration",
            SymbolContext::Comment => "word inside a comment",
            SymbolContext::String => "word inside a string literal",
            SymbolContext::Filename => "file stem token",
            SymbolContext::Exception => "caught or thrown exception type",
            SymbolContext::Goto => "goto target",
            SymbolContext::Label => "statement label",
        }
    }

    /// Parse either the compact code or the expanded name,
    /// case-insensitively.
    pub fn parse(input: &str) -> Result<SymbolContext> {
        let lowered = input.to_ascii_lowercase();
        for context in ALL_CONTEXTS {
            if lowered == context.compact() || lowered == context.expanded() {
                return Ok(*context);
            }
        }
        bail!("unknown context type '{input}' (see --list-types)");
    }
}

/// The textual extent of a definition: 1-based lines, 0-based byte
/// columns, end column exclusive. Serialized as
/// `startLine:startCol-endLine:endCol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceLocation {
    /// Parse the stored `"s:c-e:c"` form. The parse is strict: four
    /// integers, and the end line may not precede the start line.
    pub fn parse(text: &str) -> Result<SourceLocation> {
        let parse_pair = |part: &str| -> Result<(u32, u32)> {
            let (line, column) = part
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("malformed source location '{text}'"))?;
            Ok((line.parse()?, column.parse()?))
        };

        let (start, end) = text
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("malformed source location '{text}'"))?;
        let (start_line, start_column) = parse_pair(start)?;
        let (end_line, end_column) = parse_pair(end)?;

        if end_line < start_line {
            bail!("source location '{text}' ends before it starts");
        }

        Ok(SourceLocation {
            start_line,
            start_column,
            end_line,
            end_column,
        })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// One emitted symbol, before the per-file `(directory, filename)`
/// prefix is attached at flush time.
#[derive(Debug, Clone)]
pub struct SymbolRecord {
    /// 1-based line of the occurrence.
    pub line: u32,
    /// Lowercased form used for matching.
    pub symbol: String,
    /// Original-case form used for display.
    pub full_symbol: String,
    pub context: SymbolContext,
    /// Populated exactly when `is_definition` is set.
    pub source_location: Option<SourceLocation>,
    /// Enclosing named entity, or the receiver for accesses and calls.
    pub parent: String,
    /// Visibility: public/private/protected, or empty.
    pub scope: String,
    /// Storage or behavior modifier: static, const, abstract, final,
    /// readonly, async, ...
    pub modifier: String,
    /// Free-form dependency hint (enclosing function for arguments,
    /// alias source for imports, marker tags like "heredoc" or ":=").
    pub clue: String,
    /// Package/module/namespace path.
    pub namespace: String,
    /// Type annotation, verbatim (unions and intersections included).
    pub type_annotation: String,
    pub is_definition: bool,
}

impl SymbolRecord {
    pub fn new(line: u32, name: impl Into<String>, context: SymbolContext) -> SymbolRecord {
        let full_symbol = name.into();
        SymbolRecord {
            line,
            symbol: full_symbol.to_lowercase(),
            full_symbol,
            context,
            source_location: None,
            parent: String::new(),
            scope: String::new(),
            modifier: String::new(),
            clue: String::new(),
            namespace: String::new(),
            type_annotation: String::new(),
            is_definition: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> SymbolRecord {
        self.parent = parent.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> SymbolRecord {
        self.scope = scope.into();
        self
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> SymbolRecord {
        self.modifier = modifier.into();
        self
    }

    pub fn with_clue(mut self, clue: impl Into<String>) -> SymbolRecord {
        self.clue = clue.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> SymbolRecord {
        self.namespace = namespace.into();
        self
    }

    pub fn with_type(mut self, annotation: impl Into<String>) -> SymbolRecord {
        self.type_annotation = annotation.into();
        self
    }

    /// Mark this record as a definition spanning `location`.
    pub fn with_definition(mut self, location: SourceLocation) -> SymbolRecord {
        self.source_location = Some(location);
        self.is_definition = true;
        self
    }
}

/// A fully materialized row read back from `code_index`.
#[derive(Debug, Clone)]
pub struct IndexedRow {
    pub directory: String,
    pub filename: String,
    pub line: u32,
    pub symbol: String,
    pub full_symbol: String,
    pub context: SymbolContext,
    pub source_location: String,
    pub parent: String,
    pub scope: String,
    pub modifier: String,
    pub clue: String,
    pub namespace: String,
    pub type_annotation: String,
    pub is_definition: bool,
}

impl IndexedRow {
    /// Relative path of the row's file (directory already carries its
    /// trailing slash).
    pub fn path(&self) -> String {
        format!("{}{}", self.directory, self.filename)
    }

    /// Value of an extensible column by its SQL name.
    pub fn extra(&self, column: &str) -> String {
        match column {
            "parent" => self.parent.clone(),
            "scope" => self.scope.clone(),
            "modifier" => self.modifier.clone(),
            "clue" => self.clue.clone(),
            "namespace" => self.namespace.clone(),
            "type" => self.type_annotation.clone(),
            "is_definition" => {
                if self.is_definition {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            _ => String::new(),
        }
    }
}

/// A line interval produced by resolving a `--within` symbol to its
/// stored definition range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithinRange {
    pub directory: String,
    pub filename: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// Declarative description of one extensible column.
///
/// This slice is the single source of truth for everything that has
/// to stay synchronized across the planner and renderer: the SELECT
/// list, the per-row decoder, the filter-application loop, column
/// width measurement, and the help screen.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// SQL column name in `code_index`.
    pub name: &'static str,
    /// Header shown above the column.
    pub header: &'static str,
    /// Short CLI flag that filters on this column.
    pub flag: char,
    pub help: &'static str,
}

/// Extensible columns, in display order.
pub const EXTRA_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "parent",
        header: "PARENT",
        flag: 'p',
        help: "enclosing entity or receiver",
    },
    ColumnSpec {
        name: "scope",
        header: "SCOPE",
        flag: 's',
        help: "visibility (public/private/protected)",
    },
    ColumnSpec {
        name: "modifier",
        header: "MOD",
        flag: 'm',
        help: "static, const, abstract, final, readonly, async, ...",
    },
    ColumnSpec {
        name: "clue",
        header: "CLUE",
        flag: 'c',
        help: "dependency hint (caller, alias source, marker tag)",
    },
    ColumnSpec {
        name: "namespace",
        header: "NS",
        flag: 'n',
        help: "package/module/namespace path",
    },
    ColumnSpec {
        name: "type",
        header: "TYPE",
        flag: 't',
        help: "type annotation, verbatim",
    },
    ColumnSpec {
        name: "is_definition",
        header: "DEF",
        flag: 'd',
        help: "1 for definitions, 0 for usages",
    },
];

/// Look up an extensible column by its SQL name or header,
/// case-insensitively. `definition` is accepted as an alias for
/// `is_definition`.
pub fn extra_column(name: &str) -> Option<&'static ColumnSpec> {
    let mut lowered = name.to_ascii_lowercase();
    if lowered == "definition" {
        lowered = "is_definition".to_string();
    }
    EXTRA_COLUMNS
        .iter()
        .find(|spec| spec.name == lowered || spec.header.eq_ignore_ascii_case(&lowered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_parse_accepts_compact_and_expanded() {
        assert_eq!(SymbolContext::parse("fn").unwrap(), SymbolContext::Function);
        assert_eq!(
            SymbolContext::parse("function").unwrap(),
            SymbolContext::Function
        );
        assert_eq!(
            SymbolContext::parse("IFACE").unwrap(),
            SymbolContext::Interface
        );
        assert!(SymbolContext::parse("bogus").is_err());
    }

    #[test]
    fn context_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for context in ALL_CONTEXTS {
            assert!(seen.insert(context.compact()), "{}", context.compact());
        }
    }

    #[test]
    fn source_location_round_trips() {
        for text in ["45:0-54:1", "1:0-1:10", "200:4-250:0"] {
            let parsed = SourceLocation::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn source_location_rejects_malformed_input() {
        assert!(SourceLocation::parse("45:0").is_err());
        assert!(SourceLocation::parse("45-54").is_err());
        assert!(SourceLocation::parse("54:0-45:1").is_err());
        assert!(SourceLocation::parse("a:b-c:d").is_err());
    }

    #[test]
    fn record_builder_links_definition_and_location() {
        let location = SourceLocation {
            start_line: 45,
            start_column: 0,
            end_line: 54,
            end_column: 1,
        };
        let record =
            SymbolRecord::new(45, "validateUser", SymbolContext::Function).with_definition(location);

        assert!(record.is_definition);
        assert_eq!(record.symbol, "validateuser");
        assert_eq!(record.full_symbol, "validateUser");
        assert_eq!(record.source_location.unwrap().to_string(), "45:0-54:1");
    }

    #[test]
    fn extra_column_lookup_handles_aliases() {
        assert_eq!(extra_column("type").unwrap().flag, 't');
        assert_eq!(extra_column("definition").unwrap().name, "is_definition");
        assert!(extra_column("line").is_none());
    }
}
