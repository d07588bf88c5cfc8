//! The `~/.smconfig` overlay: per-user default flags for `qi`.
//!
//! The file is INI-like; only the `[qi]` section is consumed, one
//! flag (plus its values) per line. Config flags are appended *after*
//! the explicit CLI arguments, and any flag already present on the
//! command line suppresses the corresponding config line, so the CLI
//! always wins.

use std::collections::HashSet;
use std::path::PathBuf;

/// Short and long spellings of the same flag, plus the `--and` /
/// `--same-line` pairing, so presence checks see through aliases.
const FLAG_ALIASES: &[(&str, &str)] = &[
    ("-i", "--include-context"),
    ("-x", "--exclude-context"),
    ("-f", "--file"),
    ("-w", "--within"),
    ("-p", "--parent"),
    ("-t", "--type"),
    ("-m", "--modifier"),
    ("-s", "--scope"),
    ("-c", "--clue"),
    ("-n", "--namespace"),
    ("-d", "--definition"),
    ("-e", "--expand"),
    ("-v", "--verbose"),
    ("--same-line", "--and"),
    ("--def", "--definition"),
    ("--usage", "--definition"),
];

/// Location of the per-user config file.
pub fn config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".smconfig"))
}

fn canonical(flag: &str) -> &str {
    for (alias, long) in FLAG_ALIASES {
        if flag == *alias {
            return long;
        }
    }
    flag
}

/// Lines belonging to the `[qi]` section, comments stripped.
fn qi_section_lines(text: &str) -> Vec<&str> {
    let mut in_section = false;
    let mut lines = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        if trimmed.starts_with('[') {
            in_section = trimmed == "[qi]";
            continue;
        }
        if in_section {
            lines.push(trimmed);
        }
    }
    lines
}

/// Merge config defaults into the CLI argument list (argv without the
/// program name). Config lines whose flag already appears on the CLI
/// are suppressed.
pub fn apply_overlay(cli_args: &[String], config_text: &str) -> Vec<String> {
    let present: HashSet<&str> = cli_args
        .iter()
        .filter(|arg| arg.starts_with('-'))
        .map(|arg| canonical(arg.split('=').next().unwrap_or(arg)))
        .collect();

    let mut merged: Vec<String> = cli_args.to_vec();

    for line in qi_section_lines(config_text) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            continue;
        };
        if !first.starts_with('-') {
            continue;
        }
        if present.contains(canonical(first)) {
            continue;
        }
        merged.extend(tokens.iter().map(|t| t.to_string()));
    }

    merged
}
