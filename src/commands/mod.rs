pub mod categories;
pub mod columns;
pub mod csv_transform;
pub mod dedupe;
pub mod files;
pub mod jobs;
pub mod menu;
pub mod pipeline;
pub mod prices;
pub mod publish;
pub mod sku;
pub mod status;

use anyhow::Result;
use indicatif::ProgressBar;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::content;
use crate::folders::ResultFolder;

/// Per-run counters for commands that touch every selected folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderTally {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub affected: usize,
}

/// Opens each folder's database and runs `op` against `table`.
///
/// A folder whose table is missing is skipped. An error in one folder is
/// logged and counted; the loop moves on.
pub fn for_each_database<F>(
    folders: &[ResultFolder],
    table: &str,
    bar: &ProgressBar,
    mut op: F,
) -> FolderTally
where
    F: FnMut(&ResultFolder, &Connection) -> Result<usize>,
{
    let mut tally = FolderTally::default();

    for folder in folders {
        bar.set_message(folder.name.clone());
        match run_on_folder(folder, table, &mut op) {
            Ok(Some(affected)) => {
                tally.succeeded += 1;
                tally.affected += affected;
                info!(folder = %folder.name, affected, "folder done");
            }
            Ok(None) => {
                tally.skipped += 1;
                warn!(folder = %folder.name, table, "table missing, skipping folder");
            }
            Err(err) => {
                tally.failed += 1;
                error!(folder = %folder.name, error = %format!("{err:#}"), "folder failed");
            }
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    tally
}

fn run_on_folder<F>(folder: &ResultFolder, table: &str, op: &mut F) -> Result<Option<usize>>
where
    F: FnMut(&ResultFolder, &Connection) -> Result<usize>,
{
    let connection = content::open(&folder.db_path)?;
    if !content::table_exists(&connection, table)? {
        return Ok(None);
    }
    op(folder, &connection).map(Some)
}

pub fn log_tally(command: &str, tally: &FolderTally) {
    info!(
        command,
        succeeded = tally.succeeded,
        skipped = tally.skipped,
        failed = tally.failed,
        affected = tally.affected,
        "run complete"
    );
}
