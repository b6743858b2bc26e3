use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};

use crate::content::{self, quote_ident};

pub const JOB_TABLE: &str = "Job";
pub const RELATED_TABLES: [&str; 2] = ["JobWebPost", "JobDatabase"];

/// Inclusive range of positive job ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRange {
    pub start: i64,
    pub end: i64,
}

impl JobRange {
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start <= 0 || end <= 0 {
            bail!("job ids must be positive, got {start}..={end}");
        }
        if start > end {
            bail!("job range start {start} is greater than end {end}");
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        usize::try_from(self.end - self.start + 1).unwrap_or(usize::MAX)
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> {
        self.start..=self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: i64,
    pub job_name: Option<String>,
    pub xml_data: Option<String>,
}

pub fn fetch_job(connection: &Connection, job_id: i64) -> Result<Option<JobRecord>> {
    connection
        .query_row(
            "SELECT JobId, JobName, XmlData FROM Job WHERE JobId = ?1",
            [job_id],
            |row| {
                Ok(JobRecord {
                    job_id: row.get(0)?,
                    job_name: content::text_value(row.get_ref(1)?),
                    xml_data: content::text_value(row.get_ref(2)?),
                })
            },
        )
        .optional()
        .with_context(|| format!("failed to read job {job_id}"))
}

/// Returns false when no row has `job_id`.
pub fn update_job(connection: &Connection, job_id: i64, name: &str, xml: &str) -> Result<bool> {
    let updated = connection
        .execute(
            "UPDATE Job SET JobName = ?1, XmlData = ?2 WHERE JobId = ?3",
            params![name, xml, job_id],
        )
        .with_context(|| format!("failed to update job {job_id}"))?;
    Ok(updated > 0)
}

/// Rows of `table` in range, or `None` when the table does not exist.
pub fn count_in_range(connection: &Connection, table: &str, range: JobRange) -> Result<Option<i64>> {
    if !content::table_exists(connection, table)? {
        return Ok(None);
    }
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE JobId BETWEEN ?1 AND ?2",
        quote_ident(table)
    );
    let count = connection
        .query_row(&sql, params![range.start, range.end], |row| row.get(0))
        .with_context(|| format!("failed to count {table}"))?;
    Ok(Some(count))
}

pub fn delete_in_range(connection: &Connection, table: &str, range: JobRange) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE JobId BETWEEN ?1 AND ?2",
        quote_ident(table)
    );
    connection
        .execute(&sql, params![range.start, range.end])
        .with_context(|| format!("failed to delete from {table}"))
}
