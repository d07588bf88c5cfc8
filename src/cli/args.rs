//! Argument surfaces for the two binaries, plus the translation from
//! parsed flags into a planner request and render options.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::index::store::DEFAULT_DB_FILE;
use crate::models::{extra_column, ColumnSpec, SymbolContext, EXTRA_COLUMNS};
use crate::query::render::RenderOptions;
use crate::query::{literal_text, parse_file_pattern, shell_to_like, QueryRequest};

/// The `qi` query tool.
#[derive(Parser, Debug)]
#[command(
    name = "qi",
    version,
    about = "Query a symdex code index",
    after_help = "Patterns use shell-style wildcards: '*' matches any run of characters, \
                  '.' matches a single character, backslash escapes a literal.\n\
                  Config: ~/.smconfig, [qi] section, one flag per line (CLI wins)."
)]
pub struct QueryArgs {
    /// Search patterns (matched against the lowercased symbol).
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Only rows with these context types (accepts 'noise').
    #[arg(short = 'i', long = "include-context", value_name = "TYPE", num_args = 1..)]
    pub include_context: Vec<String>,

    /// Drop rows with these context types (accepts 'noise').
    #[arg(short = 'x', long = "exclude-context", value_name = "TYPE", num_args = 1..)]
    pub exclude_context: Vec<String>,

    /// File filters: globs, 'dir/name' paths, or '.ext' shorthand.
    #[arg(short = 'f', long = "file", value_name = "PATTERN", num_args = 1..)]
    pub file: Vec<String>,

    /// All patterns within N lines of each other, spelled --and=N;
    /// the bare flag requires the same line. The `=` keeps a bare
    /// pattern after the flag from being eaten as the range.
    #[arg(
        long = "and",
        value_name = "N",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "0"
    )]
    pub and_range: Option<i64>,

    /// Alias for --and.
    #[arg(
        long = "same-line",
        value_name = "N",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "0"
    )]
    pub same_line: Option<i64>,

    /// Restrict to one line ('120') or a range ('100-200').
    #[arg(long = "lines", value_name = "LINE")]
    pub lines: Option<String>,

    /// Restrict matches to the definition ranges of these symbols.
    #[arg(short = 'w', long = "within", value_name = "SYMBOL", num_args = 1..)]
    pub within: Vec<String>,

    /// Filter on the parent column.
    #[arg(short = 'p', long = "parent", value_name = "PATTERN", num_args = 1..)]
    pub parent: Vec<String>,

    /// Filter on the type column.
    #[arg(short = 't', long = "type", value_name = "PATTERN", num_args = 1..)]
    pub type_filter: Vec<String>,

    /// Filter on the modifier column.
    #[arg(short = 'm', long = "modifier", value_name = "PATTERN", num_args = 1..)]
    pub modifier: Vec<String>,

    /// Filter on the scope column.
    #[arg(short = 's', long = "scope", value_name = "PATTERN", num_args = 1..)]
    pub scope: Vec<String>,

    /// Filter on the clue column.
    #[arg(short = 'c', long = "clue", value_name = "PATTERN", num_args = 1..)]
    pub clue: Vec<String>,

    /// Filter on the namespace column.
    #[arg(short = 'n', long = "namespace", value_name = "PATTERN", num_args = 1..)]
    pub namespace: Vec<String>,

    /// Filter on is_definition (0 or 1).
    #[arg(short = 'd', long = "definition", value_name = "0|1", num_args = 1..)]
    pub definition: Vec<String>,

    /// Definitions only (same as -d 1).
    #[arg(long = "def")]
    pub def: bool,

    /// Usages only (same as -d 0).
    #[arg(long = "usage")]
    pub usage: bool,

    /// Context lines before and after each match.
    #[arg(short = 'C', value_name = "N")]
    pub context: Option<usize>,

    /// Context lines after each match.
    #[arg(short = 'A', value_name = "N")]
    pub after: Option<usize>,

    /// Context lines before each match.
    #[arg(short = 'B', value_name = "N")]
    pub before: Option<usize>,

    /// Print the full source of matching definitions.
    #[arg(short = 'e', long = "expand")]
    pub expand: bool,

    /// Maximum number of rows to print.
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Maximum number of rows per file.
    #[arg(long = "limit-per-file", value_name = "N")]
    pub limit_per_file: Option<usize>,

    /// Print matching files only.
    #[arg(long = "files")]
    pub files: bool,

    /// Print a per-file outline of definitions (needs -f).
    #[arg(long = "toc")]
    pub toc: bool,

    /// Extra columns to display (names, or 'all').
    #[arg(long = "columns", value_name = "COL", num_args = 1..)]
    pub columns: Vec<String>,

    /// Chattier progress output on stderr.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Show expanded context names instead of compact codes.
    #[arg(long = "full")]
    pub full: bool,

    /// One grep-style line per row, no grouping.
    #[arg(long = "compact")]
    pub compact: bool,

    /// Index database location.
    #[arg(long = "db-file", value_name = "PATH", default_value = DEFAULT_DB_FILE)]
    pub db_file: PathBuf,

    /// List every context type and exit.
    #[arg(long = "list-types")]
    pub list_types: bool,

    /// Log planned SQL to stderr.
    #[arg(long = "debug")]
    pub debug: bool,
}

/// The `symdex` indexer.
#[derive(Parser, Debug)]
#[command(
    name = "symdex",
    version,
    about = "Index source trees into a queryable symbol database"
)]
pub struct IndexArgs {
    /// Roots to index (defaults to the current directory).
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Run one pass and exit instead of rescanning.
    #[arg(long = "once")]
    pub once: bool,

    /// Suppress all output.
    #[arg(long = "silent")]
    pub silent: bool,

    /// Skip the startup banner.
    #[arg(long = "quiet-init")]
    pub quiet_init: bool,

    /// Log every indexed file.
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Directory names or paths to skip everywhere.
    #[arg(long = "exclude-dir", value_name = "DIR", num_args = 1..)]
    pub exclude_dir: Vec<String>,

    /// Index database location.
    #[arg(long = "db-file", value_name = "PATH", default_value = DEFAULT_DB_FILE)]
    pub db_file: PathBuf,
}

/// Fully validated query inputs.
#[derive(Debug)]
pub struct EffectiveQuery {
    pub request: QueryRequest,
    pub render: RenderOptions,
    pub toc: bool,
}

impl QueryArgs {
    /// Validate and translate the flag surface into planner and
    /// renderer inputs.
    pub fn build(&self) -> Result<EffectiveQuery> {
        if self.patterns.is_empty() && !self.toc {
            bail!("no search patterns given (example: qi 'validate*' -i fn)");
        }

        reject_commas("-i/--include-context", &self.include_context)?;
        reject_commas("-x/--exclude-context", &self.exclude_context)?;
        reject_commas("--columns", &self.columns)?;
        reject_commas("-w/--within", &self.within)?;

        let line_range = match (self.and_range, self.same_line) {
            (Some(range), _) | (None, Some(range)) => {
                if range < 0 {
                    bail!("--and takes a non-negative line range");
                }
                if self.patterns.len() < 2 {
                    bail!("--and needs at least two patterns to co-occur");
                }
                range
            }
            (None, None) => -1,
        };

        let line_filter = match &self.lines {
            None => None,
            Some(spec) => Some(parse_line_filter(spec)?),
        };

        if self.toc && self.file.is_empty() {
            bail!("--toc needs a file filter (-f)");
        }

        let mut extra_filters: Vec<(&'static str, Vec<String>)> = Vec::new();
        let likes = |values: &[String]| -> Vec<String> {
            values.iter().map(|value| shell_to_like(value)).collect()
        };
        if !self.parent.is_empty() {
            extra_filters.push(("parent", likes(&self.parent)));
        }
        if !self.scope.is_empty() {
            extra_filters.push(("scope", likes(&self.scope)));
        }
        if !self.modifier.is_empty() {
            extra_filters.push(("modifier", likes(&self.modifier)));
        }
        if !self.clue.is_empty() {
            extra_filters.push(("clue", likes(&self.clue)));
        }
        if !self.namespace.is_empty() {
            extra_filters.push(("namespace", likes(&self.namespace)));
        }
        if !self.type_filter.is_empty() {
            extra_filters.push(("type", likes(&self.type_filter)));
        }

        let mut definition = Vec::new();
        for value in &self.definition {
            match value.as_str() {
                "0" | "1" => definition.push(value.clone()),
                other => bail!("-d/--definition takes 0 or 1, not '{other}'"),
            }
        }
        if self.def {
            definition.push("1".to_string());
        }
        if self.usage {
            definition.push("0".to_string());
        }
        if !definition.is_empty() {
            definition.sort();
            definition.dedup();
            extra_filters.push(("is_definition", definition));
        }

        let request = QueryRequest {
            patterns: self.patterns.iter().map(|p| shell_to_like(p)).collect(),
            raw_patterns: self.patterns.clone(),
            include: parse_contexts(&self.include_context)?,
            exclude: parse_contexts(&self.exclude_context)?,
            file_patterns: self.file.iter().map(|f| parse_file_pattern(f)).collect(),
            line_range,
            line_filter,
            within: self.within.clone(),
            extra_filters,
            limit: self.limit,
        };

        let highlights: Vec<String> = self
            .patterns
            .iter()
            .filter_map(|pattern| literal_text(pattern))
            .map(|literal| literal.to_lowercase())
            .collect();

        let render = RenderOptions {
            show_columns: parse_columns(&self.columns)?,
            expand: self.expand,
            context_before: self.before.or(self.context).unwrap_or(0),
            context_after: self.after.or(self.context).unwrap_or(0),
            full: self.full,
            compact: self.compact,
            files_only: self.files,
            limit: self.limit,
            limit_per_file: self.limit_per_file,
            highlights,
        };

        Ok(EffectiveQuery {
            request,
            render,
            toc: self.toc,
        })
    }
}

fn reject_commas(flag: &str, values: &[String]) -> Result<()> {
    for value in values {
        if value.contains(',') {
            bail!("{flag}: separate values with spaces, not commas ('{value}')");
        }
    }
    Ok(())
}

/// Parse context names, expanding the `noise` shorthand.
fn parse_contexts(values: &[String]) -> Result<Vec<SymbolContext>> {
    let mut contexts = Vec::new();
    for value in values {
        if value.eq_ignore_ascii_case("noise") {
            contexts.push(SymbolContext::Comment);
            contexts.push(SymbolContext::String);
        } else {
            contexts.push(SymbolContext::parse(value)?);
        }
    }
    contexts.dedup();
    Ok(contexts)
}

/// `'120'` or `'100-200'`.
fn parse_line_filter(spec: &str) -> Result<(u32, u32)> {
    if let Some((start, end)) = spec.split_once('-') {
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("--lines: bad range '{spec}' (use START-END)"))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("--lines: bad range '{spec}' (use START-END)"))?;
        if end < start {
            bail!("--lines: range '{spec}' ends before it starts");
        }
        Ok((start, end))
    } else {
        let line: u32 = spec
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("--lines: bad line '{spec}'"))?;
        Ok((line, line))
    }
}

/// Resolve `--columns` names against the column schema.
fn parse_columns(values: &[String]) -> Result<Vec<&'static ColumnSpec>> {
    let mut columns: Vec<&'static ColumnSpec> = Vec::new();
    for value in values {
        if value.eq_ignore_ascii_case("all") {
            for spec in EXTRA_COLUMNS {
                if !columns.iter().any(|c| c.name == spec.name) {
                    columns.push(spec);
                }
            }
            continue;
        }
        let Some(spec) = extra_column(value) else {
            let names: Vec<&str> = EXTRA_COLUMNS.iter().map(|c| c.name).collect();
            bail!(
                "unknown column '{value}' (available: {}, or 'all')",
                names.join(", ")
            );
        };
        if !columns.iter().any(|c| c.name == spec.name) {
            columns.push(spec);
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> QueryArgs {
        QueryArgs::parse_from(std::iter::once("qi").chain(args.iter().copied()))
    }

    #[test]
    fn minimal_invocation_builds_an_or_query() {
        let args = parse(&["getUserById"]);
        let effective = args.build().expect("build");
        // SQLite LIKE is ASCII case-insensitive, so the pattern keeps
        // its spelling and still matches the lowercased symbol column.
        assert_eq!(effective.request.patterns, vec!["getUserById"]);
        assert_eq!(effective.request.line_range, -1);
        assert_eq!(effective.render.highlights, vec!["getuserbyid"]);
    }

    #[test]
    fn and_flag_bare_means_same_line() {
        let args = parse(&["malloc", "free", "--and"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.request.line_range, 0);

        let args = parse(&["malloc", "free", "--and=10"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.request.line_range, 10);
    }

    #[test]
    fn and_flag_requires_two_patterns() {
        let args = parse(&["malloc", "--and=10"]);
        let error = args.build().expect_err("should fail");
        assert!(error.to_string().contains("two patterns"));
    }

    #[test]
    fn patterns_after_the_and_flag_stay_patterns() {
        // The `=` requirement keeps a trailing bareword out of the
        // option value.
        let args = parse(&["token", "--same-line", "secret"]);
        assert_eq!(args.patterns, vec!["token", "secret"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.request.line_range, 0);

        let args = parse(&["malloc", "--and=10", "free"]);
        assert_eq!(args.patterns, vec!["malloc", "free"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.request.line_range, 10);
    }

    #[test]
    fn noise_shorthand_expands_to_comment_and_string() {
        let args = parse(&["token", "-x", "noise"]);
        let effective = args.build().expect("build");
        assert_eq!(
            effective.request.exclude,
            vec![SymbolContext::Comment, SymbolContext::String]
        );
    }

    #[test]
    fn commas_in_list_flags_are_rejected() {
        let args = parse(&["token", "-i", "fn,class"]);
        let error = args.build().expect_err("should fail");
        assert!(error.to_string().contains("not commas"));
    }

    #[test]
    fn def_and_usage_are_definition_shorthands() {
        let args = parse(&["token", "--def"]);
        let effective = args.build().expect("build");
        assert!(effective
            .request
            .extra_filters
            .iter()
            .any(|(column, values)| *column == "is_definition" && values == &["1"]));
    }

    #[test]
    fn line_filter_accepts_single_and_range_forms() {
        assert_eq!(parse_line_filter("120").expect("single"), (120, 120));
        assert_eq!(parse_line_filter("100-200").expect("range"), (100, 200));
        assert!(parse_line_filter("200-100").is_err());
        assert!(parse_line_filter("abc").is_err());
    }

    #[test]
    fn columns_accept_names_and_all() {
        let columns = parse_columns(&["parent".to_string(), "type".to_string()]).expect("columns");
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "parent");

        let all = parse_columns(&["all".to_string()]).expect("all");
        assert_eq!(all.len(), EXTRA_COLUMNS.len());

        assert!(parse_columns(&["bogus".to_string()]).is_err());
    }

    #[test]
    fn toc_requires_a_file_filter() {
        let args = parse(&["--toc"]);
        let error = args.build().expect_err("should fail");
        assert!(error.to_string().contains("-f"));

        let args = parse(&["--toc", "-f", ".py"]);
        assert!(args.build().is_ok());
    }

    #[test]
    fn wildcard_patterns_do_not_highlight() {
        let args = parse(&["get*", "literal"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.render.highlights, vec!["literal"]);
    }

    #[test]
    fn context_flag_sets_both_window_sides() {
        let args = parse(&["token", "-C", "3"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.render.context_before, 3);
        assert_eq!(effective.render.context_after, 3);

        let args = parse(&["token", "-B", "2", "-A", "5"]);
        let effective = args.build().expect("build");
        assert_eq!(effective.render.context_before, 2);
        assert_eq!(effective.render.context_after, 5);
    }
}
