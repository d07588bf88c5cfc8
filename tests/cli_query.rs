use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_fixture_project(root: &Path) {
    fs::create_dir_all(root.join("src")).expect("mkdir src");

    fs::write(
        root.join("src/auth.py"),
        r#"class SessionManager:
    def __init__(self, backend):
        self.backend = backend

    def validate_user(self, username, password):
        digest = compute_digest(password)
        return self.backend.check(username, digest)

def compute_digest(password):
    return password
"#,
    )
    .expect("write auth.py");

    fs::write(
        root.join("src/memory.py"),
        r#"def setup_pool():
    handle = alloc_buffer()
    counter = 1
    counter = 2
    counter = 3
    counter = 4
    counter = 5
    counter = 6
    release_buffer(handle)
    return handle
"#,
    )
    .expect("write memory.py");

    fs::write(
        root.join("src/server.py"),
        r#"class Dispatcher:
    def handle_request(self, request):
        parser = build_parser()
        return parser

def build_parser():
    return None

toolkit = build_parser()
"#,
    )
    .expect("write server.py");
}

fn run_indexer(root: &Path) {
    let mut cmd = cargo_bin_cmd!("symdex");
    cmd.current_dir(root);
    cmd.env("HOME", root);
    cmd.args(["--once", "--quiet-init"]);
    cmd.assert().success();
}

fn query(root: &Path, args: &[&str]) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("qi");
    cmd.current_dir(root);
    cmd.env("HOME", root);
    cmd.args(args);
    cmd
}

fn indexed_project() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_path_buf();
    write_fixture_project(&root);
    run_indexer(&root);
    (tmp, root)
}

#[test]
fn missing_database_is_a_user_error() {
    let tmp = tempdir().expect("tempdir");

    query(tmp.path(), &["anything"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("indexer"));

    assert!(!tmp.path().join("code-index.db").exists());
}

#[test]
fn wildcard_patterns_match_prefixes() {
    let (_tmp, root) = indexed_project();

    query(&root, &["validate*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("validate_user"));
}

#[test]
fn context_filters_narrow_the_kind() {
    let (_tmp, root) = indexed_project();

    // As a call only, the definition row must not appear.
    query(&root, &["build_parser", "-i", "call", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("call build_parser"))
        .stdout(predicate::str::contains("fn build_parser").not());
}

#[test]
fn file_filters_restrict_matches() {
    let (_tmp, root) = indexed_project();

    query(&root, &["*buffer*", "-f", "memory.py", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memory.py"))
        .stdout(predicate::str::contains("auth.py").not());
}

#[test]
fn proximity_requires_every_pattern_in_the_window() {
    let (_tmp, root) = indexed_project();

    // alloc_buffer on line 2, release_buffer on line 9: 7 apart.
    query(
        &root,
        &["alloc_buffer", "release_buffer", "--and=10", "--compact"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("alloc_buffer"))
    .stdout(predicate::str::contains("release_buffer"));

    query(
        &root,
        &["alloc_buffer", "release_buffer", "--and=3"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("no matches found"));
}

#[test]
fn repeated_proximity_patterns_match_their_own_anchor() {
    let (_tmp, root) = indexed_project();

    // The anchor occurrence satisfies a secondary pattern spelled the
    // same way, so every anchor row comes back.
    query(&root, &["alloc_buffer", "alloc_buffer", "--and=5", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memory.py:2:"))
        .stdout(predicate::str::contains("no matches found").not());
}

#[test]
fn same_line_mode_needs_colocation() {
    let (_tmp, root) = indexed_project();

    // handle and alloc_buffer share line 2 of memory.py.
    query(&root, &["handle", "alloc_buffer", "--same-line", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memory.py:2:"));

    query(&root, &["alloc_buffer", "release_buffer", "--same-line"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matches found"));

    // A pattern may follow the bare flag without being eaten as its
    // value.
    query(&root, &["handle", "--same-line", "alloc_buffer", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memory.py:2:"));
}

#[test]
fn and_with_one_pattern_is_a_usage_error() {
    let (_tmp, root) = indexed_project();

    query(&root, &["alloc_buffer", "--and=5"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("two patterns"));
}

#[test]
fn within_restricts_to_definition_ranges() {
    let (_tmp, root) = indexed_project();

    // handle_request spans lines 2-4; the call on line 3 is inside,
    // the definition on line 6 and the call on line 9 are not.
    query(&root, &["build_parser", "-w", "handle_request", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("server.py:3:"))
        .stdout(predicate::str::contains("server.py:9:").not());
}

#[test]
fn within_unknown_symbol_is_fatal() {
    let (_tmp, root) = indexed_project();

    query(&root, &["parser", "-w", "no_such_function"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no_such_function"));
}

#[test]
fn expand_prints_the_definition_body() {
    let (_tmp, root) = indexed_project();

    query(&root, &["validate_user", "--def", "--expand"])
        .assert()
        .success()
        .stdout(predicate::str::contains("digest = compute_digest(password)"));
}

#[test]
fn context_windows_are_numbered_and_highlighted() {
    let (_tmp, root) = indexed_project();

    let assert = query(&root, &["release_buffer", "-i", "call", "-B", "1", "-A", "1"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    assert!(stdout.contains("counter = 6"), "missing before-line: {stdout}");
    assert!(stdout.contains("return handle"), "missing after-line: {stdout}");
    // The literal pattern is wrapped in ANSI color.
    assert!(
        stdout.contains("\u{001b}[31mrelease_buffer\u{001b}[0m"),
        "missing highlight: {stdout}"
    );
}

#[test]
fn files_mode_lists_distinct_paths() {
    let (_tmp, root) = indexed_project();

    let assert = query(&root, &["*buffer*", "--files"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    assert!(stdout.contains("src/memory.py"));
    assert!(!stdout.contains(':'), "files mode prints bare paths: {stdout}");
}

#[test]
fn limit_per_file_caps_each_group() {
    let (_tmp, root) = indexed_project();

    let assert = query(&root, &["counter", "--limit-per-file", "2", "--compact"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let hits = stdout
        .lines()
        .filter(|line| line.contains("var counter"))
        .count();
    assert_eq!(hits, 2, "stdout: {stdout}");
}

#[test]
fn zero_results_for_valid_word_trigger_wrapped_retry() {
    let (_tmp, root) = indexed_project();

    // "manager" alone matches nothing; the wrapped retry finds the
    // class symbol.
    query(&root, &["manager"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retrying with wildcards"))
        .stdout(predicate::str::contains("SessionManager"));
}

#[test]
fn stopword_patterns_get_a_diagnostic_not_a_retry() {
    let (_tmp, root) = indexed_project();

    query(&root, &["the"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopword"))
        .stdout(predicate::str::contains("retrying").not())
        .stdout(predicate::str::contains("no matches found"));
}

#[test]
fn unknown_file_extension_warns_on_stderr() {
    let (_tmp, root) = indexed_project();

    query(&root, &["token", "-f", ".zig"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not handled by any indexer"));
}

#[test]
fn unknown_column_is_a_usage_error() {
    let (_tmp, root) = indexed_project();

    query(&root, &["token", "--columns", "bogus"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown column"));
}

#[test]
fn columns_flag_shows_extensible_values() {
    let (_tmp, root) = indexed_project();

    query(&root, &["validate_user", "--def", "--columns", "parent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PARENT"))
        .stdout(predicate::str::contains("SessionManager"));
}

#[test]
fn toc_outlines_definitions_per_file() {
    let (_tmp, root) = indexed_project();

    query(&root, &["--toc", "-f", "auth.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("types:"))
        .stdout(predicate::str::contains("SessionManager"))
        .stdout(predicate::str::contains("functions:"))
        .stdout(predicate::str::contains("validate_user"));
}

#[test]
fn list_types_documents_compact_and_expanded_forms() {
    let tmp = tempdir().expect("tempdir");

    query(tmp.path(), &["--list-types"])
        .assert()
        .success()
        .stdout(predicate::str::contains("function"))
        .stdout(predicate::str::contains("noise"));
}

#[test]
fn config_overlay_applies_when_cli_is_silent() {
    let (_tmp, root) = indexed_project();
    fs::write(root.join(".smconfig"), "[qi]\n--files\n").expect("write config");

    let assert = query(&root, &["validate_user"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("src/auth.py"));
    assert!(!stdout.contains(':'), "config --files should apply: {stdout}");
}

#[test]
fn cli_flags_win_over_config_lines() {
    let (_tmp, root) = indexed_project();
    fs::write(root.join(".smconfig"), "[qi]\n--limit 1\n").expect("write config");

    let assert = query(&root, &["counter", "--limit", "50", "--compact"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let hits = stdout.lines().filter(|l| l.contains("counter")).count();
    assert!(hits > 1, "CLI --limit should override config: {stdout}");
}

#[test]
fn definition_and_usage_shorthands_split_rows() {
    let (_tmp, root) = indexed_project();

    query(&root, &["build_parser", "--def", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fn build_parser"))
        .stdout(predicate::str::contains("call build_parser").not());

    query(&root, &["build_parser", "--usage", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("call build_parser"))
        .stdout(predicate::str::contains("fn build_parser").not());
}

#[test]
fn lines_filter_restricts_to_a_range() {
    let (_tmp, root) = indexed_project();

    query(&root, &["counter", "--lines", "3-4", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memory.py:3:"))
        .stdout(predicate::str::contains("memory.py:7:").not());
}
