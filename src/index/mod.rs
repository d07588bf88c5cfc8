//! The indexer driver: walk the tree, parse what changed, and keep
//! the store in sync with the filesystem.
//!
//! Each pass walks the configured roots (gitignore-aware), prunes
//! per-language ignore globs and `--exclude-dir` patterns, and
//! compares `(mtime, size)` against `file_meta` to skip unchanged
//! files. Files that vanished since the last pass have their rows
//! deleted. Without `--once` the driver rescans on a fixed interval.

pub mod store;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::extract::split_relative;
use crate::filter::SymbolFilter;
use crate::index::store::IndexStore;
use crate::language::{self, parse_source, Emitter, Language};

/// Delay between rescan passes in watch mode.
const RESCAN_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Roots to walk; defaults to the current directory.
    pub paths: Vec<PathBuf>,
    pub db_file: PathBuf,
    /// Extra directory names/paths to prune everywhere.
    pub exclude_dirs: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PassSummary {
    pub indexed: u64,
    pub removed: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub struct Indexer {
    store: IndexStore,
    root: PathBuf,
    paths: Vec<PathBuf>,
    excludes: GlobSet,
    language_ignores: HashMap<&'static str, GlobSet>,
    filters: HashMap<&'static str, SymbolFilter>,
}

impl Indexer {
    pub fn new(options: IndexerOptions) -> Result<Indexer> {
        let root = std::env::current_dir().context("failed to read current directory")?;
        let store = IndexStore::open_for_indexing(&options.db_file)?;

        let mut excludes = GlobSetBuilder::new();
        for dir in &options.exclude_dirs {
            let trimmed = dir.trim_matches('/');
            excludes.add(Glob::new(&format!("{trimmed}/**"))?);
            excludes.add(Glob::new(&format!("**/{trimmed}/**"))?);
        }
        let excludes = excludes.build()?;

        let mut language_ignores = HashMap::new();
        let mut filters = HashMap::new();
        for lang in language::all_languages() {
            let mut builder = GlobSetBuilder::new();
            for glob in lang.ignore_globs() {
                builder.add(Glob::new(glob)?);
            }
            language_ignores.insert(lang.id(), builder.build()?);
            filters.insert(lang.id(), SymbolFilter::new(&[lang.keyword_list()])?);
        }

        let paths = if options.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            options.paths
        };

        Ok(Indexer {
            store,
            root,
            paths,
            excludes,
            language_ignores,
            filters,
        })
    }

    /// Index once, or keep rescanning until the process is killed.
    pub fn run(&mut self, once: bool) -> Result<()> {
        loop {
            let summary = self.run_pass()?;
            log::info!(
                "pass complete: {} indexed, {} unchanged, {} removed, {} failed",
                summary.indexed,
                summary.skipped,
                summary.removed,
                summary.failed
            );
            if once {
                return Ok(());
            }
            std::thread::sleep(RESCAN_INTERVAL);
        }
    }

    /// One full walk: index new/changed files, drop vanished ones.
    pub fn run_pass(&mut self) -> Result<PassSummary> {
        let mut summary = PassSummary::default();
        let known = self.store.file_meta()?;
        let mut seen: HashSet<(String, String)> = HashSet::new();

        let mut walk = WalkBuilder::new(&self.paths[0]);
        for path in &self.paths[1..] {
            walk.add(path);
        }

        for entry in walk.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    log::warn!("walk error: {error}");
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let absolute = if entry.path().is_absolute() {
                entry.path().to_path_buf()
            } else {
                self.root.join(entry.path())
            };

            let Some(lang) = language::language_for_path(&absolute) else {
                continue;
            };
            let Some((directory, filename)) = split_relative(&self.root, &absolute) else {
                log::warn!(
                    "skipping {}: outside the project root",
                    absolute.display()
                );
                continue;
            };

            let relative = format!("{directory}{filename}");
            if self.excludes.is_match(&relative) {
                continue;
            }
            if let Some(ignores) = self.language_ignores.get(lang.id()) {
                if ignores.is_match(&relative) {
                    continue;
                }
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) => {
                    log::warn!("cannot stat {relative}: {error}");
                    continue;
                }
            };
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            let size = metadata.len() as i64;

            let key = (directory.clone(), filename.clone());
            seen.insert(key.clone());

            if known.get(&key) == Some(&(mtime, size)) {
                summary.skipped += 1;
                continue;
            }

            match self.index_file(lang, &absolute, &directory, &filename, mtime, size) {
                Ok(true) => {
                    summary.indexed += 1;
                    log::info!("indexed {relative}");
                }
                Ok(false) => summary.failed += 1,
                Err(error) => return Err(error),
            }
        }

        for key in known.keys() {
            if !seen.contains(key) {
                self.store.remove_file(&key.0, &key.1)?;
                summary.removed += 1;
                log::info!("removed {}{}", key.0, key.1);
            }
        }

        Ok(summary)
    }

    /// Parse and index one file. Returns `Ok(false)` when the grammar
    /// rejects it: the file is skipped and the store left untouched.
    fn index_file(
        &mut self,
        lang: &'static dyn Language,
        path: &Path,
        directory: &str,
        filename: &str,
        mtime: i64,
        size: i64,
    ) -> Result<bool> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let source = String::from_utf8_lossy(&bytes).into_owned();

        let parsed = match parse_source(lang, source, directory, filename) {
            Ok(parsed) => parsed,
            Err(error) => {
                log::warn!("parse failure in {directory}{filename}: {error}");
                return Ok(false);
            }
        };

        let filter = self
            .filters
            .get(lang.id())
            .context("missing filter for language")?;
        let mut emitter = Emitter::new(filter);
        emitter.push_filename_token(&parsed.stem);
        lang.extract(&parsed, &mut emitter)?;

        let records = emitter.into_records();
        self.store
            .replace_file(directory, filename, mtime, size, &records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::store::{BASE_COLUMNS, DEFAULT_DB_FILE};
    use std::fs;
    use tempfile::tempdir;

    fn options_for(root: &Path) -> IndexerOptions {
        IndexerOptions {
            paths: vec![root.to_path_buf()],
            db_file: root.join(DEFAULT_DB_FILE),
            exclude_dirs: Vec::new(),
        }
    }

    /// Build an indexer whose project root is the temp directory
    /// instead of the test's working directory.
    fn indexer_at(root: &Path) -> Indexer {
        let mut indexer = Indexer::new(options_for(root)).expect("indexer");
        indexer.root = root.to_path_buf();
        indexer
    }

    #[test]
    fn pass_indexes_then_skips_then_removes() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        fs::create_dir_all(root.join("src")).expect("mkdir");
        fs::write(
            root.join("src/app.py"),
            "def launch(config):\n    return config\n",
        )
        .expect("write");

        let mut indexer = indexer_at(&root);

        let first = indexer.run_pass().expect("first pass");
        assert_eq!(first.indexed, 1);
        assert_eq!(first.removed, 0);

        let second = indexer.run_pass().expect("second pass");
        assert_eq!(second.indexed, 0);
        assert_eq!(second.skipped, 1);

        fs::remove_file(root.join("src/app.py")).expect("remove");
        let third = indexer.run_pass().expect("third pass");
        assert_eq!(third.removed, 1);

        let rows = indexer
            .store
            .query_rows(&format!("SELECT {BASE_COLUMNS} FROM code_index"), &[])
            .expect("rows");
        assert!(rows.is_empty());
    }

    #[test]
    fn reindexing_unchanged_bytes_is_deterministic() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        fs::write(
            root.join("tool.py"),
            "def shovel(depth):\n    return depth * 2\n",
        )
        .expect("write");

        let mut indexer = indexer_at(&root);
        indexer.run_pass().expect("first pass");

        let snapshot = |indexer: &Indexer| -> Vec<String> {
            indexer
                .store
                .query_rows(
                    &format!(
                        "SELECT {BASE_COLUMNS} FROM code_index ORDER BY line, symbol, context"
                    ),
                    &[],
                )
                .expect("rows")
                .iter()
                .map(|row| {
                    format!(
                        "{}|{}|{}|{}|{}",
                        row.path(),
                        row.line,
                        row.symbol,
                        row.context.compact(),
                        row.source_location
                    )
                })
                .collect()
        };

        let before = snapshot(&indexer);

        // Force a rewrite of the same bytes.
        indexer.store.remove_file("", "tool.py").expect("reset");
        indexer.run_pass().expect("second pass");
        let after = snapshot(&indexer);

        assert_eq!(before, after);
        assert!(before.iter().any(|row| row.contains("shovel")));
    }

    #[test]
    fn parse_failures_leave_previous_rows_intact() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        fs::write(root.join("mod.py"), "def fine():\n    return 1\n").expect("write");

        let mut indexer = indexer_at(&root);
        indexer.run_pass().expect("first pass");

        // Break the file; the grammar rejects it and the old rows stay.
        fs::write(root.join("mod.py"), "def broken(:\n").expect("rewrite");
        let summary = indexer.run_pass().expect("second pass");
        assert_eq!(summary.failed, 1);

        let rows = indexer
            .store
            .query_rows(
                &format!("SELECT {BASE_COLUMNS} FROM code_index WHERE symbol = 'fine'"),
                &[],
            )
            .expect("rows");
        assert!(!rows.is_empty());
    }

    #[test]
    fn exclude_dirs_prune_matching_paths() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        fs::create_dir_all(root.join("generated")).expect("mkdir");
        fs::write(root.join("generated/out.py"), "def emitted():\n    pass\n").expect("write");
        fs::write(root.join("kept.py"), "def kept():\n    pass\n").expect("write");

        let mut options = options_for(&root);
        options.exclude_dirs = vec!["generated".to_string()];
        let mut indexer = Indexer::new(options).expect("indexer");
        indexer.root = root.clone();

        let summary = indexer.run_pass().expect("pass");
        assert_eq!(summary.indexed, 1);

        let rows = indexer
            .store
            .query_rows(
                &format!("SELECT {BASE_COLUMNS} FROM code_index WHERE context = 'fn'"),
                &[],
            )
            .expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "kept");
    }
}
