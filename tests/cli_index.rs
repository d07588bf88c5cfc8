use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

/// Write a small mixed-language project into a temp directory.
fn write_fixture_project(root: &Path) {
    fs::create_dir_all(root.join("src")).expect("mkdir src");
    fs::create_dir_all(root.join("web")).expect("mkdir web");

    fs::write(
        root.join("src/auth.py"),
        r#""""Session handling helpers."""

import hashlib

class SessionManager:
    def __init__(self, backend):
        self.backend = backend

    def validate_user(self, username, password):
        digest = hashlib.sha256(password).hexdigest()
        return self.backend.check(username, digest)
"#,
    )
    .expect("write auth.py");

    fs::write(
        root.join("web/handlers.js"),
        r#"import { renderPage } from "./render";

function dispatchRoute(route, params) {
    return renderPage(route, params);
}
"#,
    )
    .expect("write handlers.js");

    fs::write(
        root.join("src/Status.php"),
        r#"<?php
namespace App;

enum Status {
    case Active;
    case Archived;
}
"#,
    )
    .expect("write Status.php");
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

fn project() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_path_buf();
    write_fixture_project(&root);
    (tmp, root)
}

#[test]
fn indexing_creates_the_database_next_to_the_project() {
    let (_tmp, root) = project();
    run_indexer(&root);
    assert!(root.join("code-index.db").is_file());
}

#[test]
fn indexed_definitions_are_queryable_per_language() {
    let (_tmp, root) = project();
    run_indexer(&root);

    query(&root, &["validate_user", "--def"])
        .assert()
        .success()
        .stdout(predicate::str::contains("validate_user"))
        .stdout(predicate::str::contains("src/auth.py"));

    query(&root, &["dispatchRoute", "--def"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dispatchRoute"))
        .stdout(predicate::str::contains("web/handlers.js"));

    query(&root, &["Status", "-i", "enum"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status.php"));
}

#[test]
fn reindexing_is_idempotent() {
    let (_tmp, root) = project();
    run_indexer(&root);

    let first = query(&root, &["validate_user", "--compact"])
        .assert()
        .success();
    let first_out = String::from_utf8_lossy(&first.get_output().stdout).to_string();

    run_indexer(&root);

    let second = query(&root, &["validate_user", "--compact"])
        .assert()
        .success();
    let second_out = String::from_utf8_lossy(&second.get_output().stdout).to_string();

    assert_eq!(first_out, second_out);
}

#[test]
fn deleted_files_disappear_from_the_index() {
    let (_tmp, root) = project();
    run_indexer(&root);

    query(&root, &["dispatchRoute"]).assert().success().stdout(
        predicate::str::contains("web/handlers.js"),
    );

    fs::remove_file(root.join("web/handlers.js")).expect("remove");
    run_indexer(&root);

    query(&root, &["dispatchRoute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matches found"));
}

#[test]
fn edited_files_are_replaced_not_appended() {
    let (_tmp, root) = project();
    run_indexer(&root);

    // Rewrite with a renamed function; the old symbol must be gone.
    fs::write(
        root.join("web/handlers.js"),
        "function renamedRoute(route) {\n    return route;\n}\n",
    )
    .expect("rewrite");
    run_indexer(&root);

    query(&root, &["renamedRoute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("renamedRoute"));

    query(&root, &["dispatchRoute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matches found"));
}

#[test]
fn exclude_dir_prunes_whole_subtrees() {
    let (_tmp, root) = project();
    fs::create_dir_all(root.join("generated")).expect("mkdir");
    fs::write(
        root.join("generated/machine.py"),
        "def machine_made():\n    pass\n",
    )
    .expect("write");

    let mut cmd = cargo_bin_cmd!("symdex");
    cmd.current_dir(&root);
    cmd.env("HOME", &root);
    cmd.args(["--once", "--quiet-init", "--exclude-dir", "generated"]);
    cmd.assert().success();

    query(&root, &["machine_made"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matches found"));

    query(&root, &["validate_user"])
        .assert()
        .success()
        .stdout(predicate::str::contains("validate_user"));
}

#[test]
fn broken_files_are_skipped_without_corrupting_the_store() {
    let (_tmp, root) = project();
    fs::write(root.join("src/broken.py"), "def broken(:\n").expect("write");

    run_indexer(&root);

    // The valid files still indexed fine.
    query(&root, &["validate_user"])
        .assert()
        .success()
        .stdout(predicate::str::contains("validate_user"));
}

#[test]
fn filename_stem_is_a_searchable_token() {
    let (_tmp, root) = project();
    run_indexer(&root);

    query(&root, &["handlers", "-i", "filename"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web/handlers.js"));
}

#[test]
fn silent_mode_prints_nothing() {
    let (_tmp, root) = project();

    let mut cmd = cargo_bin_cmd!("symdex");
    cmd.current_dir(&root);
    cmd.env("HOME", &root);
    cmd.args(["--once", "--silent"]);
    let assert = cmd.assert().success();
    let output = assert.get_output();
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}
