//! Single-column rewrites applied to every selected folder.

use anyhow::Result;
use tracing::warn;

use crate::cli::{CopyColumnArgs, ReplaceTextArgs, SplitColorsArgs, UnifySpecsArgs};
use crate::commands::{for_each_database, log_tally};
use crate::content::{self, SizeExtractor};
use crate::folders;
use crate::model::columns;
use crate::progress::Progress;

pub fn replace_text(args: ReplaceTextArgs, progress: &Progress) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let bar = progress.bar(selected.len(), "replace");

    let tally = for_each_database(&selected, table, &bar, |_, connection| {
        content::replace_in_column(connection, table, &args.column, &args.from, &args.to)
    });

    log_tally("replace-text", &tally);
    Ok(())
}

pub fn copy_column(args: CopyColumnArgs, progress: &Progress) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let bar = progress.bar(selected.len(), "copy");

    let tally = for_each_database(&selected, table, &bar, |_, connection| {
        content::copy_column(connection, table, &args.from, &args.to)
    });

    log_tally("copy-column", &tally);
    Ok(())
}

pub fn split_colors(args: SplitColorsArgs, progress: &Progress) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let extractor = SizeExtractor::new()?;
    let bar = progress.bar(selected.len(), "colors");

    let required = [args.source.as_str(), columns::COLOR, columns::SIZE];
    let tally = for_each_database(&selected, table, &bar, |folder, connection| {
        let existing = content::column_names(connection, table)?;
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !existing.iter().any(|column| column == name))
            .collect();
        if !missing.is_empty() {
            warn!(folder = %folder.name, missing = ?missing, "required columns missing");
            return Ok(0);
        }

        content::split_colors(connection, table, &args.source, &extractor)
    });

    log_tally("split-colors", &tally);
    Ok(())
}

pub fn unify_specs(args: UnifySpecsArgs, progress: &Progress) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let bar = progress.bar(selected.len(), "specs");

    let tally = for_each_database(&selected, table, &bar, |_, connection| {
        content::set_column_all(connection, table, columns::SIZE, &args.value)
    });

    log_tally("unify-specs", &tally);
    Ok(())
}
