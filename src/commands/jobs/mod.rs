//! Edits the scraper's job configuration database (`config.db3`).

mod matching;
mod store;
mod xml;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::cli::{
    JobsAssignArgs, JobsLinksArgs, JobsRemoveArgs, JobsUnmatchedArgs, LinkMatch,
};
use crate::content;
use crate::progress::Progress;
use crate::util;

use matching::{CategoryLinks, LinkFiles, Unmatched};
use store::{JOB_TABLE, JobRange, RELATED_TABLES};

const FILE_PREFIX: &str = "#FILE#";

fn open_job_db(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        bail!("job database does not exist: {}", path.display());
    }
    content::open(path)
}

fn load_categories(path: &Path) -> Result<Vec<String>> {
    let categories = util::read_nonempty_lines(path)?;
    if categories.is_empty() {
        bail!("category file is empty: {}", path.display());
    }
    info!(path = %path.display(), count = categories.len(), "loaded categories");
    Ok(categories)
}

pub fn remove(args: JobsRemoveArgs) -> Result<()> {
    let range = JobRange::new(args.job.start, args.job.end)?;
    let connection = open_job_db(&args.job.db_path)?;

    let Some(jobs) = store::count_in_range(&connection, JOB_TABLE, range)? else {
        bail!("table {JOB_TABLE} missing in {}", args.job.db_path.display());
    };
    info!(start = range.start, end = range.end, table = JOB_TABLE, rows = jobs, "rows to delete");
    for table in RELATED_TABLES {
        match store::count_in_range(&connection, table, range)? {
            Some(rows) => info!(table, rows, "rows to delete"),
            None => warn!(table, "related table missing"),
        }
    }

    if args.dry_run {
        info!("dry run, nothing deleted");
        return Ok(());
    }

    if args.backup {
        let mut backup: OsString = args.job.db_path.clone().into_os_string();
        backup.push(".bak");
        let backup = PathBuf::from(backup);
        let sha256 = util::copy_with_digest(&args.job.db_path, &backup)?;
        info!(path = %backup.display(), sha256 = %sha256, "job database backed up");
    }

    let mut total = 0;
    if !args.keep_related {
        for table in RELATED_TABLES {
            if !content::table_exists(&connection, table)? {
                continue;
            }
            let deleted = store::delete_in_range(&connection, table, range)?;
            info!(table, deleted, "related rows deleted");
            total += deleted;
        }
    }

    let deleted = store::delete_in_range(&connection, JOB_TABLE, range)?;
    total += deleted;
    info!(table = JOB_TABLE, deleted, total, "jobs deleted");
    Ok(())
}

/// Where a job's `<StartAddress>` comes from.
enum StartSource {
    Category,
    Files {
        files: LinkFiles,
        mode: LinkMatch,
        prefix: bool,
    },
}

impl StartSource {
    /// `None` when the category has no link file.
    fn address(&self, category: &str, index: usize) -> Option<String> {
        match self {
            StartSource::Category => Some(category.to_string()),
            StartSource::Files {
                files,
                mode,
                prefix,
            } => {
                let path = match mode {
                    LinkMatch::Name => files.by_name(category)?,
                    LinkMatch::Order => files.by_position(index)?,
                };
                let path = path.display().to_string();
                Some(if *prefix {
                    format!("{FILE_PREFIX}{path}")
                } else {
                    path
                })
            }
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssignOutcome {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_categories: Vec<String>,
}

fn log_unmatched(unmatched: &[Unmatched]) {
    for entry in unmatched {
        warn!(
            category = %entry.category,
            expected = %entry.expected_file,
            "no link file for category"
        );
    }
    if !unmatched.is_empty() {
        warn!(count = unmatched.len(), "unmatched categories");
    }
}

pub fn assign(args: JobsAssignArgs, progress: &Progress) -> Result<()> {
    let range = JobRange::new(args.job.start, args.job.end)?;
    let categories = load_categories(&args.categories)?;

    let links = match &args.category_links {
        Some(path) => match CategoryLinks::load(path) {
            Ok(links) => Some(links),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "category links unavailable");
                None
            }
        },
        None => None,
    };

    let source = if args.start_from_category {
        StartSource::Category
    } else {
        let Some(dir) = &args.links_dir else {
            bail!("--links-dir is required unless --start-from-category is set");
        };
        let files = LinkFiles::scan(dir)?;
        if files.is_empty() {
            bail!("no .txt files in {}", dir.display());
        }
        info!(dir = %dir.display(), files = files.len(), "link files found");

        if args.match_mode == LinkMatch::Name {
            let unmatched = matching::unmatched_categories(&categories, &files);
            log_unmatched(&unmatched);
            if !unmatched.is_empty() && !args.dry_run {
                let path = matching::write_unmatched_report(&args.report_dir, &unmatched)?;
                info!(path = %path.display(), "unmatched report written");
            }
        }

        StartSource::Files {
            files,
            mode: args.match_mode,
            prefix: !args.no_file_prefix,
        }
    };

    let job_count = planned_job_count(range, &categories, &source);
    let connection = open_job_db(&args.job.db_path)?;
    let outcome = assign_jobs(
        &connection,
        range,
        &categories[..job_count],
        &source,
        args.dry_run,
        progress,
    )?;

    info!(
        processed = outcome.processed,
        skipped = outcome.skipped,
        failed = outcome.failed,
        target = job_count,
        dry_run = args.dry_run,
        "job assignment complete"
    );

    if !outcome.failed_categories.is_empty() {
        match &links {
            Some(links) if !args.dry_run => {
                let path = matching::write_failed_links_report(
                    &args.report_dir,
                    &outcome.failed_categories,
                    links,
                )?;
                info!(path = %path.display(), "failed category links written");
            }
            Some(_) => {}
            None => warn!(
                count = outcome.failed_categories.len(),
                "no category links loaded, failed categories not exported"
            ),
        }
    }

    Ok(())
}

/// Jobs to touch: the range, capped by category lines and, in order mode, by link files.
fn planned_job_count(range: JobRange, categories: &[String], source: &StartSource) -> usize {
    let mut count = range.len();
    // Name mode caps at the category count; categories without a file still use up a job.
    if categories.len() < count {
        warn!(
            needed = count,
            available = categories.len(),
            "fewer categories than jobs"
        );
        count = categories.len();
    }
    if let StartSource::Files {
        files,
        mode: LinkMatch::Order,
        ..
    } = source
        && files.len() < count
    {
        warn!(needed = count, available = files.len(), "fewer link files than jobs");
        count = files.len();
    }
    count
}

fn assign_jobs(
    connection: &Connection,
    range: JobRange,
    categories: &[String],
    source: &StartSource,
    dry_run: bool,
    progress: &Progress,
) -> Result<AssignOutcome> {
    let bar = progress.bar(categories.len(), "jobs");
    let mut outcome = AssignOutcome::default();

    for (index, (job_id, category)) in range.ids().zip(categories).enumerate() {
        bar.inc(1);

        let Some(address) = source.address(category, index) else {
            outcome.skipped += 1;
            outcome.failed_categories.push(category.clone());
            continue;
        };

        let Some(job) = store::fetch_job(connection, job_id)? else {
            warn!(job_id, "job missing, skipping");
            outcome.skipped += 1;
            continue;
        };

        let patched = match xml::patch_job_xml(
            job.xml_data.as_deref().unwrap_or_default(),
            category,
            &address,
        ) {
            Ok(patched) => patched,
            Err(err) => {
                error!(job_id, error = %format!("{err:#}"), "failed to patch job XML");
                outcome.failed += 1;
                outcome.failed_categories.push(category.clone());
                continue;
            }
        };

        if dry_run {
            info!(
                job_id,
                old_name = %job.job_name.unwrap_or_default(),
                new_name = %category,
                start_address = %address,
                "dry run"
            );
            outcome.processed += 1;
            continue;
        }

        if store::update_job(connection, job.job_id, category, &patched)? {
            outcome.processed += 1;
            info!(job_id, name = %category, start_address = %address, "job updated");
        } else {
            outcome.failed += 1;
            outcome.failed_categories.push(category.clone());
        }
    }

    bar.finish_and_clear();
    Ok(outcome)
}

pub fn unmatched(args: JobsUnmatchedArgs) -> Result<()> {
    let categories = load_categories(&args.categories)?;
    let files = LinkFiles::scan(&args.links_dir)?;
    let unmatched = matching::unmatched_categories(&categories, &files);

    if unmatched.is_empty() {
        info!(categories = categories.len(), "every category has a link file");
        return Ok(());
    }

    log_unmatched(&unmatched);
    let path = matching::write_unmatched_report(&args.report_dir, &unmatched)?;
    info!(path = %path.display(), "unmatched report written");
    Ok(())
}

pub fn links(args: JobsLinksArgs) -> Result<()> {
    let links = CategoryLinks::load(&args.category_links)?;
    info!(count = links.len(), "category links loaded");
    for (index, (category, link)) in links.iter().take(5).enumerate() {
        info!(index = index + 1, category, link, "category link");
    }
    Ok(())
}
