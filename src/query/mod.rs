//! The query planner: translate a flag-rich request into relational
//! queries against `code_index`.
//!
//! Three modes exist. OR-mode (the default) is a single SELECT whose
//! symbol predicate is a disjunction of bound `LIKE` parameters.
//! Same-line mode (`--and` with range 0) INTERSECTs per-pattern
//! `(directory, filename, line)` subqueries. Proximity mode
//! (`--and=N`) materializes a two-step anchor/secondary search into a
//! session-local temp table which the final SELECT then reads.
//!
//! Pattern safety: OR-mode binds patterns as parameters; the
//! multi-subquery paths embed them through single-quote doubling.
//! Raw user input is never concatenated into SQL.

pub mod render;

use anyhow::Result;
use rusqlite::ToSql;

use crate::index::store::{IndexStore, BASE_COLUMNS};
use crate::models::{SymbolContext, WithinRange};

/// A parsed `-f` argument: optional directory part plus a filename
/// pattern, both already in LIKE form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    /// LIKE pattern for the directory column, with trailing slash.
    pub directory: Option<String>,
    /// Whether the directory part was anchored (`./` or `/` prefix):
    /// anchored patterns match from the project root only.
    pub anchored: bool,
    /// LIKE pattern for the filename column.
    pub filename: String,
}

/// One fully-resolved query, ready for planning.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// Symbol patterns, already converted to LIKE form.
    pub patterns: Vec<String>,
    /// Original pattern spellings, for diagnostics and highlighting.
    pub raw_patterns: Vec<String>,
    pub include: Vec<SymbolContext>,
    pub exclude: Vec<SymbolContext>,
    pub file_patterns: Vec<FilePattern>,
    /// `< 0` disabled, `0` same line, `> 0` within N lines.
    pub line_range: i64,
    pub line_filter: Option<(u32, u32)>,
    pub within: Vec<String>,
    /// Extensible column filters: `(sql column, LIKE patterns)`.
    pub extra_filters: Vec<(&'static str, Vec<String>)>,
    pub limit: Option<usize>,
}

/// Convert a shell-style symbol pattern into a LIKE pattern:
/// unescaped `*` becomes `%`, unescaped `.` becomes `_`, backslash
/// escapes survive untouched (every LIKE here runs with `ESCAPE '\'`).
/// The conversion is idempotent.
pub fn shell_to_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' => out.push('%'),
            '.' => out.push('_'),
            other => out.push(other),
        }
    }
    out
}

/// Filename patterns convert only `*`: a literal dot must stay a dot
/// so extension shorthand matches exactly.
pub fn filename_to_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' => out.push('%'),
            other => out.push(other),
        }
    }
    out
}

/// Whether a raw pattern contains any unescaped wildcard character.
pub fn has_wildcard(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '.' | '%' | '_' => return true,
            _ => {}
        }
    }
    false
}

/// The literal text of a wildcard-free pattern, with escapes removed.
/// Wildcarded patterns have no single literal form.
pub fn literal_text(pattern: &str) -> Option<String> {
    if has_wildcard(pattern) {
        return None;
    }
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Quote a string for inline SQL embedding by doubling single quotes.
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Parse one `-f` argument by splitting on the last `/`.
///
/// `.c` is extension shorthand for any C file; `src/` matches a
/// directory at any depth; `./src/` and `/src/` match from the
/// project root only.
pub fn parse_file_pattern(raw: &str) -> FilePattern {
    let (directory_raw, filename_raw) = match raw.rsplit_once('/') {
        Some((directory, filename)) => (Some(directory), filename),
        None => (None, raw),
    };

    let filename = if filename_raw.is_empty() {
        "%".to_string()
    } else if let Some(extension) = filename_raw.strip_prefix('.') {
        if !extension.is_empty() && !extension.contains(['.', '*']) {
            format!("%.{extension}")
        } else {
            filename_to_like(filename_raw)
        }
    } else {
        filename_to_like(filename_raw)
    };

    let Some(directory_raw) = directory_raw else {
        return FilePattern {
            directory: None,
            anchored: false,
            filename,
        };
    };

    let anchored = raw.starts_with("./") || raw.starts_with('/');
    let trimmed = directory_raw
        .trim_start_matches("./")
        .trim_start_matches('/');

    let mut directory = filename_to_like(trimmed);
    if !directory.is_empty() && !directory.ends_with('/') {
        directory.push('/');
    }

    FilePattern {
        directory: Some(directory),
        anchored,
        filename,
    }
}

/// The uniform filter stack applied to every subquery and
/// materialization step. Clauses carry inline-quoted values so they
/// can be embedded into INTERSECT branches and temp-table inserts.
#[derive(Debug, Clone, Default)]
pub struct FilterStack {
    clauses: Vec<String>,
}

impl FilterStack {
    pub fn build(request: &QueryRequest, within: &[WithinRange]) -> FilterStack {
        let mut stack = FilterStack::default();

        if !request.file_patterns.is_empty() {
            let mut alternatives = Vec::new();
            for pattern in &request.file_patterns {
                let mut parts = Vec::new();
                if let Some(directory) = &pattern.directory {
                    if pattern.anchored {
                        parts.push(format!(
                            "directory LIKE {} ESCAPE '\\'",
                            sql_quote(directory)
                        ));
                    } else if directory.is_empty() {
                        parts.push("directory = ''".to_string());
                    } else {
                        // Unanchored directories match at any path
                        // boundary.
                        parts.push(format!(
                            "(directory LIKE {} ESCAPE '\\' OR directory LIKE {} ESCAPE '\\')",
                            sql_quote(directory),
                            sql_quote(&format!("%/{directory}"))
                        ));
                    }
                }
                parts.push(format!(
                    "filename LIKE {} ESCAPE '\\'",
                    sql_quote(&pattern.filename)
                ));
                alternatives.push(format!("({})", parts.join(" AND ")));
            }
            stack.clauses.push(format!("({})", alternatives.join(" OR ")));
        }

        if let Some((start, end)) = request.line_filter {
            if start == end {
                stack.clauses.push(format!("line = {start}"));
            } else {
                stack.clauses.push(format!("line BETWEEN {start} AND {end}"));
            }
        }

        if !within.is_empty() {
            let ranges: Vec<String> = within
                .iter()
                .map(|range| {
                    format!(
                        "(directory = {} AND filename = {} AND line BETWEEN {} AND {})",
                        sql_quote(&range.directory),
                        sql_quote(&range.filename),
                        range.start_line,
                        range.end_line
                    )
                })
                .collect();
            stack.clauses.push(format!("({})", ranges.join(" OR ")));
        }

        if !request.include.is_empty() {
            let list: Vec<String> = request
                .include
                .iter()
                .map(|context| sql_quote(context.compact()))
                .collect();
            stack.clauses.push(format!("context IN ({})", list.join(", ")));
        }
        if !request.exclude.is_empty() {
            let list: Vec<String> = request
                .exclude
                .iter()
                .map(|context| sql_quote(context.compact()))
                .collect();
            stack
                .clauses
                .push(format!("context NOT IN ({})", list.join(", ")));
        }

        for (column, patterns) in &request.extra_filters {
            if patterns.is_empty() {
                continue;
            }
            if *column == "is_definition" {
                let values: Vec<&str> = patterns
                    .iter()
                    .map(|p| if p == "0" { "0" } else { "1" })
                    .collect();
                stack
                    .clauses
                    .push(format!("is_definition IN ({})", values.join(", ")));
            } else {
                let likes: Vec<String> = patterns
                    .iter()
                    .map(|pattern| {
                        format!("{column} LIKE {} ESCAPE '\\'", sql_quote(pattern))
                    })
                    .collect();
                stack.clauses.push(format!("({})", likes.join(" OR ")));
            }
        }

        stack
    }

    /// `" AND c1 AND c2 ..."`, or empty when no filters apply.
    pub fn sql_suffix(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" AND {}", self.clauses.join(" AND "))
        }
    }

    /// `"WHERE c1 AND ..."`, or empty.
    pub fn sql_where(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// A planned SELECT over the [`BASE_COLUMNS`] shape plus its bound
/// parameters.
#[derive(Debug, Clone)]
pub struct PlannedQuery {
    pub sql: String,
    pub bindings: Vec<String>,
}

impl PlannedQuery {
    pub fn binding_refs(&self) -> Vec<&dyn ToSql> {
        self.bindings.iter().map(|b| b as &dyn ToSql).collect()
    }
}

/// Resolve every `--within` name to its definition ranges; the union
/// of all ranges constrains the query. Any unresolved name is fatal.
pub fn resolve_within(store: &IndexStore, names: &[String]) -> Result<Vec<WithinRange>> {
    let mut ranges = Vec::new();
    for name in names {
        ranges.extend(store.resolve_within(name)?);
    }
    Ok(ranges)
}

/// Plan (and for proximity mode, materialize) the query.
pub fn plan(store: &IndexStore, request: &QueryRequest) -> Result<PlannedQuery> {
    let within = resolve_within(store, &request.within)?;
    let filters = FilterStack::build(request, &within);

    if request.line_range < 0 || request.patterns.len() < 2 {
        return Ok(plan_or_mode(request, &filters));
    }

    if request.line_range == 0 {
        return Ok(plan_same_line(request, &filters));
    }

    materialize_proximity(store, request, &filters)?;

    let limit = limit_clause(request.limit);
    Ok(PlannedQuery {
        sql: format!(
            "SELECT DISTINCT {BASE_COLUMNS} FROM proximity_results \
             ORDER BY directory, filename, line, symbol{limit}"
        ),
        bindings: Vec::new(),
    })
}

fn limit_clause(limit: Option<usize>) -> String {
    limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default()
}

/// Single SELECT, symbol patterns as bound parameters.
fn plan_or_mode(request: &QueryRequest, filters: &FilterStack) -> PlannedQuery {
    let mut clauses = Vec::new();
    for index in 1..=request.patterns.len() {
        clauses.push(format!("symbol LIKE ?{index} ESCAPE '\\'"));
    }

    let symbol_predicate = if clauses.is_empty() {
        "1".to_string()
    } else {
        format!("({})", clauses.join(" OR "))
    };

    let limit = limit_clause(request.limit);
    PlannedQuery {
        sql: format!(
            "SELECT {BASE_COLUMNS} FROM code_index WHERE {symbol_predicate}{} \
             ORDER BY directory, filename, line, symbol{limit}",
            filters.sql_suffix()
        ),
        bindings: request.patterns.clone(),
    }
}

/// INTERSECT of per-pattern line sets; the outer SELECT keeps only
/// rows whose symbol matches one of the inputs.
fn plan_same_line(request: &QueryRequest, filters: &FilterStack) -> PlannedQuery {
    let branches: Vec<String> = request
        .patterns
        .iter()
        .map(|pattern| {
            format!(
                "SELECT directory, filename, line FROM code_index \
                 WHERE symbol LIKE {} ESCAPE '\\'{}",
                sql_quote(pattern),
                filters.sql_suffix()
            )
        })
        .collect();

    let outer: Vec<String> = request
        .patterns
        .iter()
        .map(|pattern| format!("symbol LIKE {} ESCAPE '\\'", sql_quote(pattern)))
        .collect();

    let limit = limit_clause(request.limit);
    PlannedQuery {
        sql: format!(
            "SELECT {BASE_COLUMNS} FROM code_index \
             WHERE (directory, filename, line) IN ({}) AND ({}){} \
             ORDER BY directory, filename, line, symbol{limit}",
            branches.join(" INTERSECT "),
            outer.join(" OR "),
            filters.sql_suffix()
        ),
        bindings: Vec::new(),
    }
}

/// Two-step proximity: anchors matching the first pattern, then a
/// window check for every distinct secondary pattern. Qualifying
/// windows land in `temp.proximity_results`.
fn materialize_proximity(
    store: &IndexStore,
    request: &QueryRequest,
    filters: &FilterStack,
) -> Result<()> {
    let range = request.line_range as u32;
    let anchor_pattern = &request.patterns[0];

    // Distinct secondary patterns. One that repeats the anchor's
    // spelling stays in: its window check is satisfied by the anchor
    // occurrence itself, so a repeated pattern matches every anchor.
    let mut secondary: Vec<&String> = Vec::new();
    for pattern in &request.patterns[1..] {
        if !secondary.contains(&pattern) {
            secondary.push(pattern);
        }
    }

    store.prepare_proximity_table()?;

    let anchors = store.query_rows(
        &format!(
            "SELECT {BASE_COLUMNS} FROM code_index \
             WHERE symbol LIKE {} ESCAPE '\\'{} \
             ORDER BY directory, filename, line",
            sql_quote(anchor_pattern),
            filters.sql_suffix()
        ),
        &[],
    )?;

    for anchor in &anchors {
        let low = anchor.line.saturating_sub(range).max(1);
        let high = anchor.line + range;

        let mut all_present = true;
        for pattern in &secondary {
            let count = store.query_count(
                &format!(
                    "SELECT COUNT(*) FROM code_index \
                     WHERE directory = {} AND filename = {} \
                       AND line BETWEEN {low} AND {high} \
                       AND symbol LIKE {} ESCAPE '\\'{}",
                    sql_quote(&anchor.directory),
                    sql_quote(&anchor.filename),
                    sql_quote(pattern),
                    filters.sql_suffix()
                ),
                &[],
            )?;
            if count == 0 {
                all_present = false;
                break;
            }
        }
        if !all_present {
            continue;
        }

        let secondary_predicate: Vec<String> = secondary
            .iter()
            .map(|pattern| format!("symbol LIKE {} ESCAPE '\\'", sql_quote(pattern)))
            .collect();

        store.execute(
            &format!(
                "INSERT INTO proximity_results \
                 SELECT {BASE_COLUMNS} FROM code_index \
                 WHERE directory = {} AND filename = {} \
                   AND ((line = {} AND symbol LIKE {} ESCAPE '\\') \
                     OR (line BETWEEN {low} AND {high} AND ({}))){}",
                sql_quote(&anchor.directory),
                sql_quote(&anchor.filename),
                anchor.line,
                sql_quote(anchor_pattern),
                secondary_predicate.join(" OR "),
                filters.sql_suffix()
            ),
            &[],
        )?;
    }

    Ok(())
}

/// Definitions for the TOC outline: every `is_definition = 1` row
/// under the filter stack, optionally narrowed by symbol patterns.
pub fn plan_toc(store: &IndexStore, request: &QueryRequest) -> Result<PlannedQuery> {
    let within = resolve_within(store, &request.within)?;
    let filters = FilterStack::build(request, &within);

    let mut clauses = Vec::new();
    for index in 1..=request.patterns.len() {
        clauses.push(format!("symbol LIKE ?{index} ESCAPE '\\'"));
    }
    let symbol_predicate = if clauses.is_empty() {
        String::new()
    } else {
        format!(" AND ({})", clauses.join(" OR "))
    };

    let limit = limit_clause(request.limit);
    Ok(PlannedQuery {
        sql: format!(
            "SELECT {BASE_COLUMNS} FROM code_index \
             WHERE is_definition = 1{symbol_predicate}{} \
             ORDER BY directory, filename, line{limit}",
            filters.sql_suffix()
        ),
        bindings: request.patterns.clone(),
    })
}
