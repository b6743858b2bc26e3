//! Publishes unsent `Content` rows as WooCommerce variable products.

mod categories;
mod images;
mod payload;
mod run;
mod variations;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::PublishArgs;
use crate::config::SiteConfig;
use crate::folders;
use crate::model::{PublishCounts, PublishReport};
use crate::progress::Progress;
use crate::util;
use crate::woo::WooClient;

use categories::CategoryCache;
use run::{PublishOptions, publish_folders};

pub fn run(args: PublishArgs, config_path: &Path, progress: &Progress) -> Result<()> {
    let config = SiteConfig::load(config_path)?;
    let (key, secret) = config.woo_credentials()?;
    let mut client = WooClient::new(&config.base_url)
        .context("failed to build HTTP client")?
        .with_woo_auth(key, secret);
    if let Ok((user, password)) = config.wp_credentials() {
        client = client.with_wp_auth(user, password);
    }

    let selected = folders::select(&args.folders)?;
    if selected.is_empty() {
        warn!("no result folders selected, nothing to publish");
        return Ok(());
    }

    let options = PublishOptions {
        table: args.folders.table.clone(),
        fields: config.fields,
        reset_sent: args.reset_sent,
        throttle: Duration::from_millis(args.throttle_ms),
        upload_images: !args.no_upload_images,
    };
    let workers = args.workers.max(1);
    let started_at = util::now_utc_string();
    info!(
        base_url = %config.base_url,
        folders = selected.len(),
        workers,
        "starting publish"
    );

    let categories = CategoryCache::new();
    let bar = progress.bar(selected.len(), "publish");
    let reports = publish_folders(&client, &selected, &options, &categories, workers, &bar)?;
    bar.finish_and_clear();

    let mut totals = PublishCounts::default();
    for report in &reports {
        totals.add(&report.counts);
    }
    info!(
        rows = totals.rows,
        uploaded = totals.uploaded,
        skipped = totals.skipped,
        failed = totals.failed,
        variations = totals.variations,
        categories_cached = categories.len(),
        "publish complete"
    );

    if let Some(path) = &args.report {
        let report = PublishReport {
            started_at,
            finished_at: util::now_utc_string(),
            base_url: config.base_url.clone(),
            workers,
            folder_count: selected.len(),
            totals,
            folders: reports,
        };
        util::write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote publish report");
    }

    Ok(())
}
