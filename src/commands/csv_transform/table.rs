use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An in-memory CSV sheet with string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    #[cfg(test)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    #[cfg(test)]
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[index].as_str())
    }

    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|cells| cells[index].as_str()).collect())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(index) => {
                self.headers[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(index) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    /// Drops every column for which `predicate` returns true and returns their names.
    pub fn drop_columns_where(&mut self, predicate: impl Fn(&str) -> bool) -> Vec<String> {
        let doomed: Vec<String> = self
            .headers
            .iter()
            .filter(|header| predicate(header))
            .cloned()
            .collect();
        for name in &doomed {
            self.drop_column(name);
        }
        doomed
    }

    /// Rewrites every cell of `column`. Returns false when the column is absent.
    pub fn map_column(&mut self, column: &str, mut f: impl FnMut(&str) -> String) -> bool {
        let Some(index) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            let value = f(&row[index]);
            row[index] = value;
        }
        true
    }

    /// Sets `column` from each row's cells, appending the column when new.
    pub fn set_column(&mut self, column: &str, mut f: impl FnMut(&[String]) -> String) {
        let index = match self.column_index(column) {
            Some(index) => index,
            None => {
                self.headers.push(column.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };
        for row in &mut self.rows {
            let value = f(row);
            row[index] = value;
        }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open csv {}", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("failed to read csv header {}", path.display()))?
            .iter()
            .enumerate()
            .map(|(index, header)| {
                if index == 0 {
                    header.trim_start_matches('\u{feff}').to_string()
                } else {
                    header.to_string()
                }
            })
            .collect();

        let mut table = Self::new(headers);
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read csv row {}", path.display()))?;
            table.push_row(record.iter().map(ToOwned::to_owned).collect());
        }

        Ok(table)
    }

    /// Writes UTF-8 with a BOM so spreadsheet tools detect the encoding.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer
            .write_all(UTF8_BOM)
            .context("failed to write csv byte-order mark")?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(&self.headers)
            .context("failed to write csv header")?;
        for row in &self.rows {
            csv_writer
                .write_record(row)
                .context("failed to write csv row")?;
        }
        csv_writer.flush().context("failed to flush csv")?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create csv {}", path.display()))?;
        self.write_to(file)
            .with_context(|| format!("failed to write csv {}", path.display()))
    }
}
