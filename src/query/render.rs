//! Result rendering: per-file grouping, column width fitting, literal
//! source expansion, grep-style context windows with ANSI
//! highlighting, and the zero-result diagnostics.

use std::fs;

use anyhow::Result;

use crate::filter::{FilterVerdict, SymbolFilter};
use crate::index::store::IndexStore;
use crate::models::{ColumnSpec, IndexedRow, SourceLocation, ALL_CONTEXTS};
use crate::query::{has_wildcard, literal_text, shell_to_like, PlannedQuery, QueryRequest};

const COLOR_RED: &str = "\u{001b}[31m";
const COLOR_RESET: &str = "\u{001b}[0m";

/// Everything the renderer needs beyond the rows themselves.
#[derive(Debug, Default)]
pub struct RenderOptions {
    /// Extensible columns to display, in schema order.
    pub show_columns: Vec<&'static ColumnSpec>,
    pub expand: bool,
    pub context_before: usize,
    pub context_after: usize,
    /// Show expanded context-kind names instead of compact codes.
    pub full: bool,
    /// One row per line, `path:line:` prefixed, no grouping.
    pub compact: bool,
    pub files_only: bool,
    pub limit: Option<usize>,
    pub limit_per_file: Option<usize>,
    /// Lowercased literal pattern texts to highlight in context
    /// windows.
    pub highlights: Vec<String>,
}

/// Column widths for the active layout. Core columns are always
/// measured; extensible ones only when displayed.
#[derive(Debug, Default)]
pub struct Widths {
    pub line: usize,
    pub context: usize,
    pub symbol: usize,
    pub extras: Vec<usize>,
}

/// Measure column widths with a `MAX(LENGTH(...))` probe over the
/// planned result set.
pub fn measure_widths(
    store: &IndexStore,
    planned: &PlannedQuery,
    options: &RenderOptions,
) -> Result<Widths> {
    let mut columns = vec!["line", "context", "full_symbol"];
    for spec in &options.show_columns {
        columns.push(spec.name);
    }

    let measured = store.max_lengths(&planned.sql, &planned.binding_refs(), &columns)?;

    let mut widths = Widths {
        line: measured.first().copied().unwrap_or(0),
        context: measured.get(1).copied().unwrap_or(0),
        symbol: measured.get(2).copied().unwrap_or(0),
        extras: measured.get(3..).map(|m| m.to_vec()).unwrap_or_default(),
    };

    // Headers participate in the fit when extras are displayed.
    if !options.show_columns.is_empty() {
        widths.line = widths.line.max("LINE".len());
        widths.context = widths.context.max("CTX".len());
        widths.symbol = widths.symbol.max("SYMBOL".len());
        for (width, spec) in widths.extras.iter_mut().zip(&options.show_columns) {
            *width = (*width).max(spec.header.len());
        }
    }

    Ok(widths)
}

fn context_label(row: &IndexedRow, full: bool) -> &'static str {
    if full {
        row.context.expanded()
    } else {
        row.context.compact()
    }
}

/// One formatted result line (without the trailing newline).
fn format_row(row: &IndexedRow, widths: &Widths, options: &RenderOptions) -> String {
    let label = context_label(row, options.full);
    let context_width = if options.full {
        widths.context.max(label.len())
    } else {
        widths.context
    };

    let mut line = if options.compact {
        format!(
            "{}:{}: {} {}",
            row.path(),
            row.line,
            label,
            row.full_symbol
        )
    } else {
        format!(
            "  {:>line_width$} {:<context_width$} {:<symbol_width$}",
            row.line,
            label,
            row.full_symbol,
            line_width = widths.line.max(1),
            symbol_width = widths.symbol.max(1),
        )
    };

    for (index, spec) in options.show_columns.iter().enumerate() {
        let value = row.extra(spec.name);
        let width = widths.extras.get(index).copied().unwrap_or(0).max(1);
        line.push(' ');
        line.push_str(&format!("{value:<width$}"));
    }

    while line.ends_with(' ') {
        line.pop();
    }
    line
}

/// Print the result set. Returns the number of rows shown.
pub fn print_rows(rows: &[IndexedRow], widths: &Widths, options: &RenderOptions) -> usize {
    if options.files_only {
        let mut files: Vec<String> = rows.iter().map(|row| row.path()).collect();
        files.sort();
        files.dedup();
        for file in &files {
            println!("{file}");
        }
        return files.len();
    }

    if !options.show_columns.is_empty() && !options.compact {
        let mut header = format!(
            "  {:>line_width$} {:<context_width$} {:<symbol_width$}",
            "LINE",
            "CTX",
            "SYMBOL",
            line_width = widths.line.max(1),
            context_width = widths.context.max(1),
            symbol_width = widths.symbol.max(1),
        );
        for (index, spec) in options.show_columns.iter().enumerate() {
            let width = widths.extras.get(index).copied().unwrap_or(0).max(1);
            header.push(' ');
            header.push_str(&format!("{:<width$}", spec.header));
        }
        println!("{}", header.trim_end());
    }

    let mut shown = 0usize;
    let mut in_file = 0usize;
    let mut current: Option<(String, String)> = None;

    for row in rows {
        if let Some(limit) = options.limit {
            if shown >= limit {
                break;
            }
        }

        let key = (row.directory.clone(), row.filename.clone());
        if current.as_ref() != Some(&key) {
            if !options.compact {
                if current.is_some() {
                    println!();
                }
                println!("{}{}", row.directory, row.filename);
            }
            current = Some(key);
            in_file = 0;
        }

        if let Some(per_file) = options.limit_per_file {
            if in_file >= per_file {
                continue;
            }
        }

        println!("{}", format_row(row, widths, options));
        shown += 1;
        in_file += 1;

        if options.expand && row.is_definition && !row.source_location.is_empty() {
            if let Ok(location) = SourceLocation::parse(&row.source_location) {
                print_expansion(&row.path(), &location);
            }
        } else if options.context_before > 0 || options.context_after > 0 {
            print_context_window(
                &row.path(),
                row.line,
                options.context_before,
                options.context_after,
                &options.highlights,
            );
        }
    }

    shown
}

/// Print the literal bytes of a definition from its stored range,
/// followed by a separator.
fn print_expansion(path: &str, location: &SourceLocation) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("warning: cannot read {path}: {error}");
            return;
        }
    };

    let lines: Vec<&str> = source.lines().collect();
    let start = location.start_line.saturating_sub(1) as usize;
    let end = (location.end_line.saturating_sub(1) as usize).min(lines.len().saturating_sub(1));
    if lines.is_empty() || start >= lines.len() {
        return;
    }

    for (offset, text) in lines[start..=end].iter().enumerate() {
        let index = start + offset;
        let mut slice: &str = text;
        if index == end {
            let cut = (location.end_column as usize).min(slice.len());
            let cut = floor_char_boundary(slice, cut);
            slice = &slice[..cut];
        }
        // The start column applies to the first line only.
        if index == start {
            let begin = (location.start_column as usize).min(slice.len());
            let begin = floor_char_boundary(slice, begin);
            slice = &slice[begin..];
        }
        println!("{slice}");
    }
    println!("--");
}

/// Print a numbered window of source lines around a match, with
/// literal patterns highlighted.
fn print_context_window(path: &str, line: u32, before: usize, after: usize, highlights: &[String]) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("warning: cannot read {path}: {error}");
            return;
        }
    };

    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return;
    }

    let center = line.saturating_sub(1) as usize;
    let start = center.saturating_sub(before);
    let end = (center + after).min(lines.len().saturating_sub(1));

    for index in start..=end {
        let text = highlight(lines[index], highlights);
        let marker = if index == center { '>' } else { ' ' };
        println!("  {marker}{:>6}: {text}", index + 1);
    }
    println!("--");
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Wrap every case-insensitive occurrence of each literal in ANSI
/// red.
pub fn highlight(text: &str, literals: &[String]) -> String {
    if literals.is_empty() {
        return text.to_string();
    }

    let lowered = text.to_lowercase();
    // Byte-offset safety: restrict matching to the common prefix
    // length where lowercasing kept the byte layout.
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for literal in literals {
        if literal.is_empty() {
            continue;
        }
        let mut from = 0;
        while let Some(found) = lowered[from..].find(literal.as_str()) {
            let start = from + found;
            let end = start + literal.len();
            if text.is_char_boundary(start) && text.is_char_boundary(end.min(text.len())) {
                ranges.push((start, end.min(text.len())));
            }
            // Advance past the first character of the match; a flat +1
            // would land inside a multi-byte character and make the
            // next slice panic.
            from = start
                + lowered[start..]
                    .chars()
                    .next()
                    .map(|c| c.len_utf8())
                    .unwrap_or(1);
            if from >= lowered.len() {
                break;
            }
        }
    }

    if ranges.is_empty() {
        return text.to_string();
    }

    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in ranges {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    let mut out = String::with_capacity(text.len() + merged.len() * 10);
    let mut cursor = 0;
    for (start, end) in merged {
        if start > text.len() || cursor > start {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(COLOR_RED);
        out.push_str(&text[start..end]);
        out.push_str(COLOR_RESET);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Print the TOC outline: definitions grouped per file, bucketed by
/// kind.
pub fn print_toc(rows: &[IndexedRow], full: bool) {
    use crate::models::SymbolContext::*;

    let bucket_of = |row: &IndexedRow| -> Option<&'static str> {
        match row.context {
            Import | Export | Namespace => Some("imports"),
            Class | Interface | Trait | Enum | Type => Some("types"),
            Function => Some("functions"),
            Property | Variable | Case => Some("members"),
            _ => None,
        }
    };

    let mut current_file: Option<std::string::String> = None;
    let mut printed_any = false;

    let mut index = 0;
    while index < rows.len() {
        let path = rows[index].path();
        let file_end = rows[index..]
            .iter()
            .position(|row| row.path() != path)
            .map(|offset| index + offset)
            .unwrap_or(rows.len());
        let file_rows = &rows[index..file_end];
        index = file_end;

        if current_file.as_ref() != Some(&path) {
            if printed_any {
                println!();
            }
            println!("{path}");
            current_file = Some(path.clone());
            printed_any = true;
        }

        for bucket in ["imports", "types", "functions", "members"] {
            let members: Vec<&IndexedRow> = file_rows
                .iter()
                .filter(|row| bucket_of(row) == Some(bucket))
                .collect();
            if members.is_empty() {
                continue;
            }
            println!("  {bucket}:");
            for row in members {
                let range = SourceLocation::parse(&row.source_location)
                    .map(|l| {
                        if l.start_line == l.end_line {
                            format!("{}", l.start_line)
                        } else {
                            format!("{}-{}", l.start_line, l.end_line)
                        }
                    })
                    .unwrap_or_else(|_| row.line.to_string());
                let label = context_label(row, full);
                println!("    {range:>9}  {label:<8} {}", row.full_symbol);
            }
        }
    }
}

/// Print the context-kind reference for `--list-types`.
pub fn print_type_list() {
    println!("{:<8} {:<10} DESCRIPTION", "CODE", "NAME");
    for context in ALL_CONTEXTS {
        println!(
            "{:<8} {:<10} {}",
            context.compact(),
            context.expanded(),
            context.describe()
        );
    }
    println!();
    println!("'noise' expands to: comment, string");
}

/// Zero-result diagnostics: per-pattern counts, filter classification,
/// and possibly a retry request with `*pattern*` wrapping.
///
/// Returns the wrapped retry request when every pattern is a
/// wildcard-free word the filter considers valid.
pub fn explain_zero_results(
    store: &IndexStore,
    request: &QueryRequest,
    filter: &SymbolFilter,
) -> Result<Option<QueryRequest>> {
    let mut retryable = !request.raw_patterns.is_empty();

    for raw in &request.raw_patterns {
        let count = store.count_full_symbol(&shell_to_like(raw))?;
        if count > 0 {
            println!("pattern '{raw}' matches {count} symbol(s) on its own");
            retryable = false;
            continue;
        }

        if has_wildcard(raw) {
            println!("pattern '{raw}' has no matches");
            retryable = false;
            continue;
        }

        let literal = literal_text(raw).unwrap_or_else(|| raw.clone());
        match filter.classify(&literal) {
            FilterVerdict::Valid => {
                println!("pattern '{raw}' has no direct matches");
            }
            verdict => {
                println!(
                    "pattern '{raw}' is {} and was never indexed",
                    verdict.describe()
                );
                retryable = false;
            }
        }
    }

    if !retryable {
        return Ok(None);
    }

    let mut retry = request.clone();
    retry.patterns = request
        .raw_patterns
        .iter()
        .map(|raw| format!("%{}%", shell_to_like(raw)))
        .collect();
    retry.raw_patterns = request
        .raw_patterns
        .iter()
        .map(|raw| format!("*{raw}*"))
        .collect();
    Ok(Some(retry))
}

/// Warn about `-f` extensions no language claims.
pub fn warn_unknown_extensions(patterns: &[crate::query::FilePattern]) {
    let known = crate::language::known_extensions();
    for pattern in patterns {
        let filename = &pattern.filename;
        let Some((_, extension)) = filename.rsplit_once('.') else {
            continue;
        };
        if extension.is_empty() || extension.contains(['%', '_', '\\']) {
            continue;
        }
        if !known.iter().any(|e| e.eq_ignore_ascii_case(extension)) {
            eprintln!(
                "warning: extension '.{extension}' is not handled by any indexer; \
                 known extensions: {}",
                known.join(", ")
            );
        }
    }
}
