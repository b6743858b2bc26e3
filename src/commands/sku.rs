use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::cli::{RandomSkuArgs, SkuArgs};
use crate::commands::{for_each_database, log_tally};
use crate::content::{self, SkuGenerator};
use crate::folders;
use crate::progress::Progress;

pub fn run(args: RandomSkuArgs, progress: &Progress) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let mut generator = generator_for(&args.sku)?;
    let bar = progress.bar(selected.len(), "sku");

    let tally = for_each_database(&selected, table, &bar, |folder, connection| {
        if args.preview {
            let rows = content::row_count(connection, table)?;
            let sample = generator.next_sku()?;
            info!(folder = %folder.name, rows, sample = %sample, "sku preview");
            return Ok(0);
        }
        assign_skus(connection, table, &args.sku.column, &mut generator)
    });

    info!(issued = generator.issued(), "unique SKUs issued");
    log_tally("random-sku", &tally);
    Ok(())
}

pub fn generator_for(args: &SkuArgs) -> Result<SkuGenerator> {
    SkuGenerator::new(args.prefix.clone(), args.length)
}

pub fn assign_skus(
    connection: &Connection,
    table: &str,
    column: &str,
    generator: &mut SkuGenerator,
) -> Result<usize> {
    content::ensure_column(connection, table, column)?;
    let updated = content::assign_random_skus(connection, table, column, generator)?;
    info!(table, column, updated, "SKUs assigned");
    Ok(updated)
}
