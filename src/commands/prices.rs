use anyhow::{Result, bail};
use rusqlite::Connection;
use tracing::info;

use crate::cli::DiscountArgs;
use crate::commands::{for_each_database, log_tally};
use crate::content;
use crate::folders;
use crate::progress::Progress;

pub fn run(args: DiscountArgs, progress: &Progress) -> Result<()> {
    validate_rate(args.rate)?;
    if let Some(factor) = args.currency_factor
        && factor <= 0.0
    {
        bail!("currency factor must be positive, got {factor}");
    }

    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let bar = progress.bar(selected.len(), "discount");

    let tally = for_each_database(&selected, table, &bar, |folder, connection| {
        if args.preview {
            let priced = content::count_numeric_prices(connection, table)?;
            info!(folder = %folder.name, priced, rate = args.rate, "discount preview");
            return Ok(0);
        }

        match args.currency_factor {
            Some(factor) => content::convert_currency(connection, table, factor, args.rate),
            None => discount_table(connection, table, args.rate),
        }
    });

    log_tally("discount", &tally);
    Ok(())
}

pub fn validate_rate(rate: f64) -> Result<()> {
    if !(rate > 0.0 && rate <= 1.0) {
        bail!("discount rate must be in (0, 1], got {rate}");
    }
    Ok(())
}

pub fn discount_table(connection: &Connection, table: &str, rate: f64) -> Result<usize> {
    let updated = content::apply_discount(connection, table, rate)?;
    info!(table, rate, updated, "sale prices recomputed");
    Ok(updated)
}
