use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::config::FieldToggles;
use crate::content::{self, ContentRow};
use crate::folders::ResultFolder;
use crate::model::{FolderPublishReport, PublishCounts, columns};
use crate::woo::Storefront;

use super::categories::CategoryCache;
use super::payload::{PayloadContext, build_payload, single_value};
use super::variations::variation_payloads;

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub table: String,
    pub fields: FieldToggles,
    pub reset_sent: bool,
    pub throttle: Duration,
    pub upload_images: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Uploaded { variations: usize },
    AlreadySent,
    ExistingSku,
    EmptyPayload,
    MissingId,
}

/// Publishes every folder, one rayon task per folder when `workers > 1`.
pub fn publish_folders<S: Storefront>(
    store: &S,
    folders: &[ResultFolder],
    options: &PublishOptions,
    categories: &CategoryCache,
    workers: usize,
    bar: &ProgressBar,
) -> Result<Vec<FolderPublishReport>> {
    let task = |folder: &ResultFolder| {
        let report = folder_report(store, folder, options, categories);
        bar.inc(1);
        report
    };

    if workers <= 1 {
        return Ok(folders.iter().map(task).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to build publish worker pool")?;
    Ok(pool.install(|| folders.par_iter().map(task).collect()))
}

fn folder_report<S: Storefront>(
    store: &S,
    folder: &ResultFolder,
    options: &PublishOptions,
    categories: &CategoryCache,
) -> FolderPublishReport {
    info!(folder = %folder.name, path = %folder.path.display(), "publishing folder");
    match publish_folder(store, folder, options, categories) {
        Ok(counts) => FolderPublishReport {
            folder: folder.name.clone(),
            status: "ok".to_string(),
            error: None,
            counts,
        },
        Err(err) => {
            error!(folder = %folder.name, error = %format!("{err:#}"), "folder publish failed");
            FolderPublishReport {
                folder: folder.name.clone(),
                status: "failed".to_string(),
                error: Some(format!("{err:#}")),
                counts: PublishCounts::default(),
            }
        }
    }
}

pub fn publish_folder<S: Storefront + ?Sized>(
    store: &S,
    folder: &ResultFolder,
    options: &PublishOptions,
    categories: &CategoryCache,
) -> Result<PublishCounts> {
    let connection = content::open(&folder.db_path)?;
    if !content::table_exists(&connection, &options.table)? {
        bail!("table {} not found in {}", options.table, folder.db_path.display());
    }

    if options.reset_sent {
        let reset = content::reset_sent_flags(&connection, &options.table)?;
        info!(folder = %folder.name, reset, "reset sent flags");
    }

    let rows = content::load_rows(&connection, &options.table)?;
    let total = rows.len();
    let mut counts = PublishCounts {
        rows: total,
        ..PublishCounts::default()
    };

    for (index, row) in rows.iter().enumerate() {
        match publish_row(store, &connection, folder, row, options, categories) {
            Ok(RowOutcome::Uploaded { variations }) => {
                counts.uploaded += 1;
                counts.variations += variations;
            }
            Ok(_) => counts.skipped += 1,
            Err(err) => {
                counts.failed += 1;
                warn!(folder = %folder.name, id = ?row.id, error = %format!("{err:#}"), "row failed");
            }
        }

        info!(
            folder = %folder.name,
            processed = index + 1,
            total,
            uploaded = counts.uploaded,
            skipped = counts.skipped,
            failed = counts.failed,
            remaining = total - index - 1,
            "progress"
        );
    }

    Ok(counts)
}

pub fn publish_row<S: Storefront + ?Sized>(
    store: &S,
    connection: &Connection,
    folder: &ResultFolder,
    row: &ContentRow,
    options: &PublishOptions,
    categories: &CategoryCache,
) -> Result<RowOutcome> {
    if row.is_sent() {
        return Ok(RowOutcome::AlreadySent);
    }
    let Some(id) = row.id else {
        warn!(folder = %folder.name, "row has no ID, skipping");
        return Ok(RowOutcome::MissingId);
    };

    let fields = &options.fields;
    if fields.sku
        && let Some(sku) = single_value(row, columns::SKU)
    {
        match store.find_product_by_sku(&sku) {
            Ok(Some(existing)) => {
                info!(id, sku = %sku, product_id = existing.id, "product with this SKU exists, marking sent");
                let url = existing.url().filter(|_| fields.page_url);
                content::mark_sent(connection, &options.table, id, url)?;
                return Ok(RowOutcome::ExistingSku);
            }
            Ok(None) => {}
            Err(err) => warn!(id, sku = %sku, error = %err, "SKU lookup failed, publishing anyway"),
        }
    }

    let context = PayloadContext {
        store,
        folder: &folder.path,
        fields,
        upload_images: options.upload_images,
        categories,
    };
    let payload = build_payload(row, &context);
    if payload.is_empty() {
        info!(id, "empty payload, skipping");
        return Ok(RowOutcome::EmptyPayload);
    }

    let product = store
        .create_product(&payload)
        .with_context(|| format!("failed to create product for row {id}"))?;
    info!(id, product_id = product.id, name = ?payload.name, "product created");

    let mut variations = 0;
    for variation in variation_payloads(row, fields) {
        match store.create_variation(product.id, &variation) {
            Ok(created) => {
                variations += 1;
                info!(product_id = product.id, variation_id = created.id, "variation created");
            }
            Err(err) => warn!(product_id = product.id, error = %err, "variation create failed"),
        }
    }

    let url = product.url().filter(|_| fields.page_url);
    if let Err(err) = content::mark_sent(connection, &options.table, id, url) {
        warn!(id, product_id = product.id, error = %format!("{err:#}"), "product created but sent flag not written");
    }

    if !options.throttle.is_zero() {
        thread::sleep(options.throttle);
    }

    Ok(RowOutcome::Uploaded { variations })
}
