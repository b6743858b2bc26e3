mod table;
mod transforms;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{CsvCategoriesArgs, CsvTransformArgs, ExportCsvArgs};
use crate::content;
use crate::folders::{self, FolderRange};
use crate::model::columns;
use crate::util;

use table::Table;
use transforms::{ImageRewriter, SizeCleaner};

pub fn export(args: ExportCsvArgs) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table_name = args.folders.table.as_str();
    let mut exported = 0_usize;
    let mut failed = 0_usize;

    for folder in &selected {
        let target = folder.path.join(&args.csv_name);
        match export_folder(&folder.db_path, table_name, &target) {
            Ok(Some(rows)) => {
                exported += 1;
                info!(folder = %folder.name, rows, path = %target.display(), "exported csv");
            }
            Ok(None) => warn!(folder = %folder.name, table = table_name, "table missing, skipping"),
            Err(err) => {
                failed += 1;
                warn!(folder = %folder.name, error = %format!("{err:#}"), "export failed");
            }
        }
    }

    info!(folders = selected.len(), exported, failed, "export complete");
    Ok(())
}

fn export_folder(db_path: &Path, table_name: &str, target: &Path) -> Result<Option<usize>> {
    let connection = content::open(db_path)?;
    if !content::table_exists(&connection, table_name)? {
        return Ok(None);
    }

    let mut table = table_from_sqlite(&connection, table_name)?;
    let dropped = table.drop_columns_where(transforms::is_duplicate_column);
    if !dropped.is_empty() {
        info!(columns = ?dropped, "dropped duplicate helper columns");
    }

    table.write_csv(target)?;
    Ok(Some(table.len()))
}

/// Reads a whole table, keeping the declared column order.
pub fn table_from_sqlite(connection: &Connection, table_name: &str) -> Result<Table> {
    let sql = format!("SELECT * FROM {}", content::quote_ident(table_name));
    let mut statement = connection
        .prepare(&sql)
        .with_context(|| format!("failed to read table {table_name}"))?;

    let headers: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect();
    let width = headers.len();
    let mut table = Table::new(headers);

    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for index in 0..width {
            cells.push(content::text_value(row.get_ref(index)?).unwrap_or_default());
        }
        table.push_row(cells);
    }

    Ok(table)
}

/// Options for [`apply_transforms`].
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub images: Option<ImageRewriter>,
    pub sizes: SizeCleaner,
}

/// Runs every importer transform in order and returns the names of the ones applied.
pub fn apply_transforms(table: &mut Table, options: &TransformOptions) -> Vec<&'static str> {
    let mut applied = Vec::new();
    let mut record = |name: &'static str, done: bool| {
        if done {
            applied.push(name);
        } else {
            info!(step = name, "column missing, step skipped");
        }
    };

    record(
        "nested-categories",
        transforms::nest_categories(table, columns::CATEGORY),
    );
    record("title-to-name", transforms::rename_title(table));
    if let Some(rewriter) = &options.images {
        record(
            "image-urls",
            table.map_column(columns::IMAGES, |raw| rewriter.rewrite(raw)),
        );
    }
    record("color-attribute", transforms::color_attribute(table));
    record(
        "size-attribute",
        transforms::size_attribute(table, &options.sizes),
    );
    record("price-columns", transforms::rename_prices(table));

    applied
}

pub fn transform(args: CsvTransformArgs) -> Result<()> {
    let range = FolderRange::new(args.folders.start, args.folders.end)?;
    let options = TransformOptions {
        images: args
            .image_base_url
            .as_deref()
            .map(|base| ImageRewriter::new(base, &args.image_suffix))
            .transpose()?,
        sizes: SizeCleaner::new()?,
    };

    let mut processed = 0_usize;
    for (_, name, path) in folders::discover_folders(&args.folders.root, range)? {
        let csv_path = path.join(&args.csv_name);
        if !csv_path.is_file() {
            warn!(folder = %name, path = %csv_path.display(), "csv missing, skipping");
            continue;
        }

        let mut table = Table::read_csv(&csv_path)?;
        let applied = apply_transforms(&mut table, &options);
        let written = save_with_fallback(&table, &csv_path)?;
        processed += 1;
        info!(
            folder = %name,
            rows = table.len(),
            steps = ?applied,
            path = %written.display(),
            "csv transformed"
        );
    }

    if processed == 0 {
        bail!(
            "no {} found in range {} under {}",
            args.csv_name,
            range.describe(),
            args.folders.root.display()
        );
    }
    Ok(())
}

/// Overwrites `path`; on a permission error writes `temp_<name>` beside it.
pub fn save_with_fallback(table: &Table, path: &Path) -> Result<PathBuf> {
    match File::create(path) {
        Ok(file) => {
            table
                .write_to(file)
                .with_context(|| format!("failed to write csv {}", path.display()))?;
            Ok(path.to_path_buf())
        }
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            let name = path
                .file_name()
                .map(|value| value.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output.csv".to_string());
            let fallback = path.with_file_name(format!("temp_{name}"));
            warn!(
                path = %path.display(),
                fallback = %fallback.display(),
                "csv is locked, writing a temporary copy"
            );
            table.write_csv(&fallback)?;
            Ok(fallback)
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to create csv {}", path.display()))
        }
    }
}

pub fn format_categories(args: CsvCategoriesArgs) -> Result<()> {
    let mut files = util::list_files_with_extension(&args.dir, "csv")?;
    files.sort();

    let mut formatted = 0_usize;
    for path in &files {
        let mut table = match Table::read_csv(path) {
            Ok(table) => table,
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "failed to read csv");
                continue;
            }
        };

        if !transforms::nest_categories(&mut table, &args.field) {
            warn!(path = %path.display(), field = %args.field, "field missing");
            continue;
        }

        table.write_csv(path)?;
        formatted += 1;
        info!(path = %path.display(), rows = table.len(), "categories formatted");
    }

    info!(files = files.len(), formatted, "category formatting complete");
    Ok(())
}
