//! SQLite-backed index store.
//!
//! One primary table, `code_index`, holds every symbol row; the
//! `file_meta` sidecar lets the indexer skip unchanged files and
//! detect deletions. The connection is configured with:
//!
//! - `journal_mode = WAL` so any number of indexer processes can
//!   write while readers keep running.
//! - `synchronous = NORMAL` as the safety/speed balance.
//! - a busy timeout to ride out transient `database is locked` errors.
//!
//! Per-file reindexing is one transaction (DELETE + bulk INSERT +
//! COMMIT): a concurrent reader sees either the old row set or the
//! new one, never a mix. The query side opens the database strictly
//! read-only and refuses to create it.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags, ToSql};

use crate::models::{IndexedRow, SourceLocation, SymbolContext, SymbolRecord, WithinRange};

/// Default on-disk location, relative to the project root.
pub const DEFAULT_DB_FILE: &str = "code-index.db";

/// Column list of `code_index`, in decode order. Every SELECT that
/// feeds [`IndexStore::query_rows`] must use exactly this list.
pub const BASE_COLUMNS: &str = "directory, filename, line, symbol, full_symbol, context, \
     source_location, parent, scope, modifier, clue, namespace, type, is_definition";

#[derive(Debug)]
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Open (or create) the index for writing. Enables WAL on first
    /// open so concurrent indexer processes stay safe.
    pub fn open_for_indexing(path: &Path) -> Result<IndexStore> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("failed to open index database at {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;

        Self::initialize_schema(&conn)?;

        Ok(IndexStore { conn })
    }

    /// Open an existing index read-only. A missing database is a user
    /// error, not a reason to create one.
    pub fn open_read_only(path: &Path) -> Result<IndexStore> {
        if !path.is_file() {
            bail!(
                "index database not found at {}; run the symdex indexer first",
                path.display()
            );
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open index database at {}", path.display()))?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;

        Ok(IndexStore { conn })
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS code_index (
                directory       TEXT NOT NULL,
                filename        TEXT NOT NULL,
                line            INTEGER NOT NULL,
                symbol          TEXT NOT NULL,
                full_symbol     TEXT NOT NULL,
                context         TEXT NOT NULL,
                source_location TEXT NOT NULL DEFAULT '',
                parent          TEXT NOT NULL DEFAULT '',
                scope           TEXT NOT NULL DEFAULT '',
                modifier        TEXT NOT NULL DEFAULT '',
                clue            TEXT NOT NULL DEFAULT '',
                namespace       TEXT NOT NULL DEFAULT '',
                type            TEXT NOT NULL DEFAULT '',
                is_definition   INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_code_index_file
                ON code_index(filename, directory);
            CREATE INDEX IF NOT EXISTS idx_code_index_symbol
                ON code_index(symbol);
            CREATE INDEX IF NOT EXISTS idx_code_index_path_line
                ON code_index(directory, filename, line);

            CREATE TABLE IF NOT EXISTS file_meta (
                directory TEXT NOT NULL,
                filename  TEXT NOT NULL,
                mtime     INTEGER NOT NULL,
                size      INTEGER NOT NULL,
                PRIMARY KEY (directory, filename)
            );
        "#,
        )?;
        Ok(())
    }

    /// Atomically replace every row of one file: delete the old set,
    /// insert the new one, update `file_meta`, commit.
    pub fn replace_file(
        &mut self,
        directory: &str,
        filename: &str,
        mtime: i64,
        size: i64,
        records: &[SymbolRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM code_index WHERE directory = ?1 AND filename = ?2",
            params![directory, filename],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO file_meta (directory, filename, mtime, size)
             VALUES (?1, ?2, ?3, ?4)",
            params![directory, filename, mtime, size],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO code_index (
                    directory, filename, line, symbol, full_symbol, context,
                    source_location, parent, scope, modifier, clue, namespace,
                    type, is_definition
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;

            for record in records {
                let location = record
                    .source_location
                    .map(|l| l.to_string())
                    .unwrap_or_default();
                stmt.execute(params![
                    directory,
                    filename,
                    record.line as i64,
                    record.symbol,
                    record.full_symbol,
                    record.context.compact(),
                    location,
                    record.parent,
                    record.scope,
                    record.modifier,
                    record.clue,
                    record.namespace,
                    record.type_annotation,
                    record.is_definition as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Drop every trace of a file that no longer exists on disk.
    pub fn remove_file(&mut self, directory: &str, filename: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM code_index WHERE directory = ?1 AND filename = ?2",
            params![directory, filename],
        )?;
        tx.execute(
            "DELETE FROM file_meta WHERE directory = ?1 AND filename = ?2",
            params![directory, filename],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Everything the indexer knows about on-disk state:
    /// `(directory, filename) -> (mtime, size)`.
    pub fn file_meta(&self) -> Result<HashMap<(String, String), (i64, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT directory, filename, mtime, size FROM file_meta")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                (row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                (row.get::<_, i64>(2)?, row.get::<_, i64>(3)?),
            ))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Run a planner-produced SELECT over the [`BASE_COLUMNS`] shape.
    pub fn query_rows(&self, sql: &str, bindings: &[&dyn ToSql]) -> Result<Vec<IndexedRow>> {
        log::debug!("query: {sql}");

        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("failed to plan query: {sql}"))?;

        let rows = stmt.query_map(rusqlite::params_from_iter(bindings.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
                row.get::<_, String>(11)?,
                row.get::<_, String>(12)?,
                row.get::<_, i64>(13)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (
                directory,
                filename,
                line,
                symbol,
                full_symbol,
                context,
                source_location,
                parent,
                scope,
                modifier,
                clue,
                namespace,
                type_annotation,
                is_definition,
            ) = row?;

            results.push(IndexedRow {
                directory,
                filename,
                line: line as u32,
                symbol,
                full_symbol,
                context: SymbolContext::parse(&context)?,
                source_location,
                parent,
                scope,
                modifier,
                clue,
                namespace,
                type_annotation,
                is_definition: is_definition != 0,
            });
        }
        Ok(results)
    }

    /// Execute a planner-produced statement (proximity
    /// materialization inserts run through here).
    pub fn execute(&self, sql: &str, bindings: &[&dyn ToSql]) -> Result<usize> {
        log::debug!("execute: {sql}");
        let count = self
            .conn
            .execute(sql, rusqlite::params_from_iter(bindings.iter()))
            .with_context(|| format!("failed to execute: {sql}"))?;
        Ok(count)
    }

    /// Single-value probe (COUNT / EXISTS style).
    pub fn query_count(&self, sql: &str, bindings: &[&dyn ToSql]) -> Result<i64> {
        let mut stmt = self.conn.prepare(sql)?;
        let value =
            stmt.query_row(rusqlite::params_from_iter(bindings.iter()), |row| row.get(0))?;
        Ok(value)
    }

    /// Direct-hit probe for zero-result diagnostics.
    pub fn count_full_symbol(&self, like_pattern: &str) -> Result<i64> {
        self.query_count(
            "SELECT COUNT(*) FROM code_index WHERE full_symbol LIKE ?1 ESCAPE '\\'",
            &[&like_pattern],
        )
    }

    /// Maximum rendered width of each listed column over the planned
    /// result set.
    pub fn max_lengths(
        &self,
        inner_sql: &str,
        bindings: &[&dyn ToSql],
        columns: &[&str],
    ) -> Result<Vec<usize>> {
        let measures: Vec<String> = columns
            .iter()
            .map(|column| format!("MAX(LENGTH({column}))"))
            .collect();
        let sql = format!("SELECT {} FROM ({inner_sql})", measures.join(", "));

        let mut stmt = self.conn.prepare(&sql)?;
        let widths = stmt.query_row(rusqlite::params_from_iter(bindings.iter()), |row| {
            let mut widths = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value: Option<i64> = row.get(index)?;
                widths.push(value.unwrap_or(0) as usize);
            }
            Ok(widths)
        })?;
        Ok(widths)
    }

    /// Resolve one `--within` name to the line ranges of its stored
    /// definitions. An unknown name is a hard error.
    pub fn resolve_within(&self, symbol: &str) -> Result<Vec<WithinRange>> {
        let mut stmt = self.conn.prepare(
            "SELECT directory, filename, source_location FROM code_index
             WHERE symbol = ?1 AND is_definition = 1 AND source_location <> ''
             ORDER BY directory, filename, line",
        )?;

        let lowered = symbol.to_lowercase();
        let rows = stmt.query_map(params![lowered], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut ranges = Vec::new();
        for row in rows {
            let (directory, filename, location) = row?;
            let parsed = SourceLocation::parse(&location)?;
            ranges.push(WithinRange {
                directory,
                filename,
                start_line: parsed.start_line,
                end_line: parsed.end_line,
            });
        }

        if ranges.is_empty() {
            bail!("--within: no definition found for '{symbol}'");
        }
        Ok(ranges)
    }

    /// Drop and recreate the session-local proximity table with the
    /// same shape as `code_index`. Temp tables live in the separate
    /// temp database, so this works on read-only connections too.
    pub fn prepare_proximity_table(&self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS temp.proximity_results;
             CREATE TEMP TABLE proximity_results AS SELECT * FROM code_index WHERE 0;",
        )?;
        Ok(())
    }
}
