use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::content;
use crate::folders;

pub fn run(args: StatusArgs) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();

    let mut total_rows = 0_i64;
    let mut total_sent = 0_i64;

    for folder in &selected {
        let connection = content::open(&folder.db_path)?;
        if !content::table_exists(&connection, table)? {
            warn!(folder = %folder.name, table, "table missing");
            continue;
        }

        let rows = content::row_count(&connection, table)?;
        let has_sent_column = content::column_names(&connection, table)?
            .iter()
            .any(|name| name == crate::model::columns::SENT);
        let sent = if has_sent_column {
            content::sent_count(&connection, table).unwrap_or(0)
        } else {
            0
        };

        total_rows += rows;
        total_sent += sent;

        info!(
            folder = %folder.name,
            rows,
            published = sent,
            unpublished = rows - sent,
            "folder status"
        );
    }

    info!(
        folders = selected.len(),
        rows = total_rows,
        published = total_sent,
        unpublished = total_rows - total_sent,
        "status totals"
    );

    Ok(())
}
