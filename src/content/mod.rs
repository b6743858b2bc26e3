//! SQL operations on a result database's `Content` table.
//!
//! Every statement commits on its own; nothing here spans tables in one
//! transaction.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use crate::fields;
use crate::model::columns;

mod colors;
mod sku;
#[cfg(test)]
mod tests;

pub use colors::SizeExtractor;
pub use sku::SkuGenerator;

/// Column-name fragments that mark a column as holding category text.
const CATEGORY_KEYWORDS: &[&str] = &["category", "分类", "cat", "type", "类型", "tag", "标签"];

/// One `Content` record with every column kept as optional text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentRow {
    pub id: Option<i64>,
    values: BTreeMap<String, Option<String>>,
}

impl ContentRow {
    #[cfg(test)]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        id: Option<i64>,
        pairs: impl IntoIterator<Item = (K, Option<V>)>,
    ) -> Self {
        Self {
            id,
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.map(Into::into)))
                .collect(),
        }
    }

    /// Raw text of a column, `None` when absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|value| value.as_deref())
    }

    /// Column text when present and not blank.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|value| !value.trim().is_empty())
    }

    pub fn is_sent(&self) -> bool {
        self.non_empty(columns::SENT)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .is_some_and(|value| value != 0.0)
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn open(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    connection
        .busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    Ok(connection)
}

pub fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = connection
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to look up table {table}"))?;
    Ok(found.is_some())
}

pub fn table_names(connection: &Connection) -> Result<Vec<String>> {
    let mut statement = connection.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = statement
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

pub fn column_names(connection: &Connection, table: &str) -> Result<Vec<String>> {
    let pragma_sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table}"))?;

    let names = statement
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Adds `column TEXT DEFAULT ''` when missing. Returns whether it was added.
pub fn ensure_column(connection: &Connection, table: &str, column: &str) -> Result<bool> {
    if column_names(connection, table)?
        .iter()
        .any(|existing| existing == column)
    {
        return Ok(false);
    }

    let alter_sql = format!(
        "ALTER TABLE {} ADD COLUMN {} TEXT DEFAULT ''",
        quote_ident(table),
        quote_ident(column)
    );
    connection
        .execute(&alter_sql, [])
        .with_context(|| format!("failed to add column {column} on {table}"))?;
    Ok(true)
}

pub fn row_count(connection: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count = connection.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Rows whose sent flag is set.
pub fn sent_count(connection: &Connection, table: &str) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {sent} IS NOT NULL AND {sent} != 0",
        quote_ident(table),
        sent = quote_ident(columns::SENT)
    );
    let count = connection.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Replaces `<table>_backup` with a fresh copy of `table`.
pub fn backup_table(connection: &Connection, table: &str) -> Result<String> {
    let backup = format!("{table}_backup");
    connection
        .execute_batch(&format!(
            "DROP TABLE IF EXISTS {backup_ident};
             CREATE TABLE {backup_ident} AS SELECT * FROM {table_ident};",
            backup_ident = quote_ident(&backup),
            table_ident = quote_ident(table)
        ))
        .with_context(|| format!("failed to back up table {table}"))?;
    Ok(backup)
}

/// Deletes every row whose `ID` is not the smallest of its SKU group.
pub fn dedupe_by_sku(connection: &Connection, table: &str) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {t} WHERE {id} NOT IN (SELECT MIN({id}) FROM {t} GROUP BY {sku})",
        t = quote_ident(table),
        id = quote_ident(columns::ID),
        sku = quote_ident(columns::SKU)
    );
    let deleted = connection
        .execute(&sql, [])
        .with_context(|| format!("failed to deduplicate {table} by SKU"))?;
    Ok(deleted)
}

pub fn delete_rows_without_images(connection: &Connection, table: &str) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {t} WHERE {img} IS NULL OR TRIM({img}) = ''",
        t = quote_ident(table),
        img = quote_ident(columns::IMAGES)
    );
    let deleted = connection
        .execute(&sql, [])
        .with_context(|| format!("failed to delete image-less rows from {table}"))?;
    Ok(deleted)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateStats {
    pub total_rows: i64,
    pub duplicate_groups: i64,
    pub rows_without_images: i64,
}

pub fn duplicate_stats(connection: &Connection, table: &str) -> Result<DuplicateStats> {
    let t = quote_ident(table);
    let sku = quote_ident(columns::SKU);
    let img = quote_ident(columns::IMAGES);

    let duplicate_groups = connection.query_row(
        &format!(
            "SELECT COUNT(*) FROM (SELECT {sku}, COUNT(*) AS cnt FROM {t} GROUP BY {sku} HAVING cnt > 1)"
        ),
        [],
        |row| row.get(0),
    )?;
    let rows_without_images = connection.query_row(
        &format!("SELECT COUNT(*) FROM {t} WHERE {img} IS NULL OR TRIM({img}) = ''"),
        [],
        |row| row.get(0),
    )?;

    Ok(DuplicateStats {
        total_rows: row_count(connection, table)?,
        duplicate_groups,
        rows_without_images,
    })
}

fn numeric_price_filter() -> String {
    format!("{} GLOB '[0-9]*'", quote_ident(columns::REGULAR_PRICE))
}

/// Rows whose regular price starts with a digit.
pub fn count_numeric_prices(connection: &Connection, table: &str) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        quote_ident(table),
        numeric_price_filter()
    );
    let count = connection.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Sets the sale price to `regular * rate`, formatted to two decimals.
pub fn apply_discount(connection: &Connection, table: &str, rate: f64) -> Result<usize> {
    let sql = format!(
        "UPDATE {t} SET {sale} = printf('%.2f', CAST({regular} AS REAL) * ?1) WHERE {filter}",
        t = quote_ident(table),
        sale = quote_ident(columns::SALE_PRICE),
        regular = quote_ident(columns::REGULAR_PRICE),
        filter = numeric_price_filter()
    );
    let updated = connection
        .execute(&sql, params![rate])
        .with_context(|| format!("failed to apply discount on {table}"))?;
    Ok(updated)
}

/// Converts the regular price by `factor` and derives the sale price from the converted value.
pub fn convert_currency(
    connection: &Connection,
    table: &str,
    factor: f64,
    rate: f64,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {t}
         SET {regular} = printf('%.2f', CAST({regular} AS REAL) * ?1),
             {sale} = printf('%.2f', CAST({regular} AS REAL) * ?1 * ?2)
         WHERE {filter}",
        t = quote_ident(table),
        sale = quote_ident(columns::SALE_PRICE),
        regular = quote_ident(columns::REGULAR_PRICE),
        filter = numeric_price_filter()
    );
    let updated = connection
        .execute(&sql, params![factor, rate])
        .with_context(|| format!("failed to convert prices on {table}"))?;
    Ok(updated)
}

pub fn replace_in_column(
    connection: &Connection,
    table: &str,
    column: &str,
    from: &str,
    to: &str,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {t} SET {c} = REPLACE({c}, ?1, ?2) WHERE INSTR({c}, ?1) > 0",
        t = quote_ident(table),
        c = quote_ident(column)
    );
    let updated = connection
        .execute(&sql, params![from, to])
        .with_context(|| format!("failed to rewrite {column} on {table}"))?;
    Ok(updated)
}

/// Copies non-empty values of `from` into `to`.
pub fn copy_column(connection: &Connection, table: &str, from: &str, to: &str) -> Result<usize> {
    let sql = format!(
        "UPDATE {t} SET {to} = {from} WHERE {from} IS NOT NULL AND {from} != ''",
        t = quote_ident(table),
        from = quote_ident(from),
        to = quote_ident(to)
    );
    let updated = connection
        .execute(&sql, [])
        .with_context(|| format!("failed to copy {from} into {to} on {table}"))?;
    Ok(updated)
}

/// Writes `value` into `column` for every row, adding the column first if needed.
pub fn set_column_all(
    connection: &Connection,
    table: &str,
    column: &str,
    value: &str,
) -> Result<usize> {
    ensure_column(connection, table, column)?;
    let sql = format!(
        "UPDATE {} SET {} = ?1",
        quote_ident(table),
        quote_ident(column)
    );
    let updated = connection
        .execute(&sql, [value])
        .with_context(|| format!("failed to set {column} on {table}"))?;
    Ok(updated)
}

/// Rewrites color and size from the raw `source` column of every row.
pub fn split_colors(
    connection: &Connection,
    table: &str,
    source: &str,
    extractor: &SizeExtractor,
) -> Result<usize> {
    let select_sql = format!(
        "SELECT rowid, {} FROM {}",
        quote_ident(source),
        quote_ident(table)
    );
    let rows = {
        let mut statement = connection.prepare(&select_sql)?;
        statement
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, text_value(row.get_ref(1)?)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    let update_sql = format!(
        "UPDATE {} SET {} = ?1, {} = ?2 WHERE rowid = ?3",
        quote_ident(table),
        quote_ident(columns::COLOR),
        quote_ident(columns::SIZE)
    );

    let tx = connection.unchecked_transaction()?;
    {
        let mut statement = tx.prepare(&update_sql)?;
        for (rowid, raw) in &rows {
            let (colors, sizes) = extractor.split(raw.as_deref().unwrap_or_default());
            statement.execute(params![colors, sizes, rowid])?;
        }
    }
    tx.commit()?;

    Ok(rows.len())
}

/// Gives every row a fresh SKU from `generator`.
pub fn assign_random_skus(
    connection: &Connection,
    table: &str,
    column: &str,
    generator: &mut SkuGenerator,
) -> Result<usize> {
    let ids = {
        let mut statement = connection.prepare(&format!(
            "SELECT {} FROM {}",
            quote_ident(columns::ID),
            quote_ident(table)
        ))?;
        statement
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    let update_sql = format!(
        "UPDATE {} SET {} = ?1 WHERE {} = ?2",
        quote_ident(table),
        quote_ident(column),
        quote_ident(columns::ID)
    );

    let tx = connection.unchecked_transaction()?;
    let mut updated = 0;
    {
        let mut statement = tx.prepare(&update_sql)?;
        for id in ids {
            let sku = generator.next_sku()?;
            match statement.execute(params![sku, id]) {
                Ok(_) => updated += 1,
                Err(err) => warn!(id, error = %err, "failed to update SKU"),
            }
        }
    }
    tx.commit()?;

    Ok(updated)
}

/// Fills empty category-like columns in every table with `value`.
pub fn fill_empty_category_columns(connection: &Connection, value: &str) -> Result<usize> {
    let mut total = 0;

    for table in table_names(connection)? {
        let category_columns: Vec<String> = column_names(connection, &table)?
            .into_iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                CATEGORY_KEYWORDS
                    .iter()
                    .any(|keyword| lower.contains(keyword))
            })
            .collect();

        for column in category_columns {
            let sql = format!(
                "UPDATE {t} SET {c} = ?1 WHERE {c} IS NULL OR {c} = '' OR {c} = 'NULL'",
                t = quote_ident(&table),
                c = quote_ident(&column)
            );
            match connection.execute(&sql, [value]) {
                Ok(updated) => total += updated,
                Err(err) => warn!(table = %table, column = %column, error = %err, "failed to fill column"),
            }
        }
    }

    Ok(total)
}

pub fn load_rows(connection: &Connection, table: &str) -> Result<Vec<ContentRow>> {
    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut statement = connection
        .prepare(&sql)
        .with_context(|| format!("failed to read table {table}"))?;

    let names: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect();
    let id_index = names
        .iter()
        .position(|name| name.eq_ignore_ascii_case(columns::ID));

    let rows = statement
        .query_map([], |row| {
            let mut values = BTreeMap::new();
            for (index, name) in names.iter().enumerate() {
                values.insert(name.clone(), text_value(row.get_ref(index)?));
            }
            let id = match id_index {
                Some(index) => row.get::<_, Option<i64>>(index).ok().flatten(),
                None => None,
            };
            Ok(ContentRow { id, values })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn reset_sent_flags(connection: &Connection, table: &str) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET {} = 0",
        quote_ident(table),
        quote_ident(columns::SENT)
    );
    let updated = connection
        .execute(&sql, [])
        .with_context(|| format!("failed to reset sent flags on {table}"))?;
    Ok(updated)
}

/// Sets the sent flag, and `PageUrl` when a URL is given.
pub fn mark_sent(
    connection: &Connection,
    table: &str,
    id: i64,
    page_url: Option<&str>,
) -> Result<()> {
    let t = quote_ident(table);
    let sent = quote_ident(columns::SENT);
    let key = quote_ident(columns::ID);

    let updated = match page_url {
        Some(url) => connection.execute(
            &format!(
                "UPDATE {t} SET {sent} = 1, {page} = ?1 WHERE {key} = ?2",
                page = quote_ident(columns::PAGE_URL)
            ),
            params![url, id],
        ),
        None => connection.execute(
            &format!("UPDATE {t} SET {sent} = 1 WHERE {key} = ?1"),
            params![id],
        ),
    };
    updated.with_context(|| format!("failed to mark row {id} as sent"))?;

    Ok(())
}

/// Distinct category paths of rows that have been published.
pub fn published_category_paths(connection: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let sql = format!(
        "SELECT DISTINCT {cat} FROM {t}
         WHERE {sent} IS NOT NULL AND {sent} != 0
           AND {cat} IS NOT NULL AND TRIM({cat}) != ''",
        t = quote_ident(table),
        cat = quote_ident(columns::CATEGORY),
        sent = quote_ident(columns::SENT)
    );
    let mut statement = connection
        .prepare(&sql)
        .with_context(|| format!("failed to read categories from {table}"))?;

    let mut paths = BTreeSet::new();
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        if let Some(value) = text_value(row.get_ref(0)?) {
            let trimmed = value.trim();
            if !fields::split_multi(trimmed).is_empty() {
                paths.insert(trimmed.to_string());
            }
        }
    }

    Ok(paths)
}

/// Renders any SQLite value as text; NULL becomes `None`.
pub fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
