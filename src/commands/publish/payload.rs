use std::path::Path;

use crate::config::FieldToggles;
use crate::content::ContentRow;
use crate::fields;
use crate::model::columns;
use crate::woo::{CategoryRef, MetaData, ProductAttribute, ProductPayload, Storefront, TagRef};

use super::categories::CategoryCache;
use super::images::resolve_images;

pub const DEFAULT_NAME: &str = "Untitled";
pub const PRODUCT_TYPE: &str = "variable";

/// Everything payload building needs besides the row itself.
pub struct PayloadContext<'a, S: Storefront + ?Sized> {
    pub store: &'a S,
    pub folder: &'a Path,
    pub fields: &'a FieldToggles,
    pub upload_images: bool,
    pub categories: &'a CategoryCache,
}

/// First `|||` part of a column, `None` when blank.
pub fn single_value(row: &ContentRow, column: &str) -> Option<String> {
    row.get(column)
        .map(fields::first_value)
        .filter(|value| !value.is_empty())
}

/// Integer stock; anything that is not a whole number is ignored.
pub fn stock_quantity(row: &ContentRow) -> Option<i64> {
    single_value(row, columns::STOCK).and_then(|value| value.parse().ok())
}

pub fn build_payload<S: Storefront + ?Sized>(
    row: &ContentRow,
    context: &PayloadContext<'_, S>,
) -> ProductPayload {
    let toggles = context.fields;
    let mut payload = ProductPayload {
        kind: PRODUCT_TYPE.to_string(),
        ..ProductPayload::default()
    };

    if toggles.title {
        payload.name = Some(
            single_value(row, columns::TITLE).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        );
    }
    if toggles.content {
        payload.description = Some(single_value(row, columns::CONTENT).unwrap_or_default());
    }
    if toggles.short_description {
        payload.short_description =
            Some(single_value(row, columns::SHORT_DESCRIPTION).unwrap_or_default());
    }
    if toggles.regular_price {
        payload.regular_price = single_value(row, columns::REGULAR_PRICE);
    }
    if toggles.sale_price {
        payload.sale_price = single_value(row, columns::SALE_PRICE);
    }
    if toggles.sku {
        payload.sku = single_value(row, columns::SKU);
    }
    if toggles.stock
        && let Some(quantity) = stock_quantity(row)
    {
        payload.manage_stock = Some(true);
        payload.stock_quantity = Some(quantity);
    }
    if toggles.weight {
        payload.weight = single_value(row, columns::WEIGHT);
    }

    payload.attributes = attributes(row, toggles);

    if toggles.tags {
        payload.tags = row
            .get(columns::TAGS)
            .map(fields::split_multi)
            .unwrap_or_default()
            .into_iter()
            .map(|name| TagRef { name })
            .collect();
    }

    if toggles.category
        && let Some(path) = row.non_empty(columns::CATEGORY)
        && let Some(id) = context.categories.resolve_path(context.store, path)
    {
        payload.categories = vec![CategoryRef { id }];
    }

    if toggles.images
        && let Some(raw) = row.non_empty(columns::IMAGES)
    {
        payload.images = resolve_images(context.store, raw, context.folder, context.upload_images);
    }

    if let Some(page_url) = row.non_empty(columns::PAGE_URL) {
        payload.meta_data.push(MetaData {
            key: "source_page".to_string(),
            value: page_url.to_string(),
        });
    }

    payload
}

fn attributes(row: &ContentRow, toggles: &FieldToggles) -> Vec<ProductAttribute> {
    let mut attributes = Vec::new();

    if toggles.brand
        && let Some(brand) = single_value(row, columns::BRAND)
    {
        attributes.push(ProductAttribute {
            name: "Brand".to_string(),
            visible: true,
            variation: false,
            options: vec![brand],
        });
    }

    for (enabled, column, name) in [
        (toggles.color, columns::COLOR, "Color"),
        (toggles.size, columns::SIZE, "Size"),
    ] {
        if !enabled {
            continue;
        }
        let options = row.get(column).map(fields::split_multi).unwrap_or_default();
        if !options.is_empty() {
            attributes.push(ProductAttribute {
                name: name.to_string(),
                visible: true,
                variation: true,
                options,
            });
        }
    }

    attributes
}
