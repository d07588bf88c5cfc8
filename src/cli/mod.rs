//! Entry points for the two binaries.

mod args;
mod overlay;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

pub use args::{EffectiveQuery, IndexArgs, QueryArgs};

use crate::filter::SymbolFilter;
use crate::index::store::IndexStore;
use crate::index::{Indexer, IndexerOptions};
use crate::language;
use crate::query::{self, render};

/// Run the `qi` query tool.
pub fn run_query() -> Result<()> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    if let Some(path) = overlay::config_path() {
        if let Ok(text) = std::fs::read_to_string(path) {
            argv = overlay::apply_overlay(&argv, &text);
        }
    }

    let args = QueryArgs::parse_from(std::iter::once("qi".to_string()).chain(argv));

    let level = if args.debug {
        LevelFilter::Debug
    } else if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();

    if args.list_types {
        render::print_type_list();
        return Ok(());
    }

    let effective = args.build()?;
    let store = IndexStore::open_read_only(&args.db_file)?;

    render::warn_unknown_extensions(&effective.request.file_patterns);

    if effective.toc {
        let planned = query::plan_toc(&store, &effective.request)?;
        let rows = store.query_rows(&planned.sql, &planned.binding_refs())?;
        if rows.is_empty() {
            println!("no definitions found");
        } else {
            render::print_toc(&rows, effective.render.full);
        }
        return Ok(());
    }

    let planned = query::plan(&store, &effective.request)?;
    let rows = store.query_rows(&planned.sql, &planned.binding_refs())?;

    if !rows.is_empty() {
        let widths = render::measure_widths(&store, &planned, &effective.render)?;
        let shown = render::print_rows(&rows, &widths, &effective.render);
        log::info!("{shown} of {} row(s) shown", rows.len());
        return Ok(());
    }

    // Zero results: per-pattern diagnostics, then one wrapped retry
    // when the patterns look like valid unindexed words.
    let diagnostics_filter = SymbolFilter::new(&language::all_keyword_lists())?;
    let Some(retry) = render::explain_zero_results(&store, &effective.request, &diagnostics_filter)?
    else {
        println!("no matches found");
        return Ok(());
    };

    println!(
        "retrying with wildcards: {}",
        retry.raw_patterns.join(" ")
    );
    let planned = query::plan(&store, &retry)?;
    let rows = store.query_rows(&planned.sql, &planned.binding_refs())?;
    if rows.is_empty() {
        println!("no matches found");
    } else {
        let widths = render::measure_widths(&store, &planned, &effective.render)?;
        render::print_rows(&rows, &widths, &effective.render);
    }

    Ok(())
}

/// Run the `symdex` indexer.
pub fn run_indexer() -> Result<()> {
    let args = IndexArgs::parse();

    let level = if args.silent {
        LevelFilter::Off
    } else if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();

    if !args.silent && !args.quiet_init {
        println!(
            "symdex: indexing {} into {}",
            if args.paths.is_empty() {
                ".".to_string()
            } else {
                args.paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            },
            args.db_file.display()
        );
    }

    let mut indexer = Indexer::new(IndexerOptions {
        paths: args.paths.clone(),
        db_file: args.db_file.clone(),
        exclude_dirs: args.exclude_dir.clone(),
    })?;
    indexer.run(args.once)
}
