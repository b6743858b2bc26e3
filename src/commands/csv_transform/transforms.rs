//! Column reshaping for the WooCommerce product CSV importer.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

use super::table::Table;
use crate::fields;
use crate::model::columns;

pub const NAME_COLUMN: &str = "名称";
pub const REGULAR_PRICE_OUT: &str = "常规售价";
pub const SALE_PRICE_OUT: &str = "促销价格";

/// Rewrites `column` as nested category text. Returns false when absent.
pub fn nest_categories(table: &mut Table, column: &str) -> bool {
    table.map_column(column, fields::nested_category_text)
}

pub fn rename_title(table: &mut Table) -> bool {
    table.rename_column(columns::TITLE, NAME_COLUMN)
}

/// Points scraped `/files/` image URLs at a WordPress upload directory.
#[derive(Debug, Clone)]
pub struct ImageRewriter {
    pattern: Regex,
    base_url: String,
    suffix: String,
}

impl ImageRewriter {
    pub fn new(base_url: &str, suffix: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"/files/([^?]+)").context("failed to compile image pattern")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn rewrite_url(&self, url: &str) -> String {
        let Some(captures) = self.pattern.captures(url) else {
            return url.to_string();
        };
        let filename = &captures[1];
        let renamed = match filename.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}{}.{ext}", self.suffix),
            None => format!("{filename}{}", self.suffix),
        };
        format!("{}/{renamed}", self.base_url)
    }

    /// Rewrites each `|||` URL and joins the results with `, `.
    pub fn rewrite(&self, raw: &str) -> String {
        fields::split_multi(raw)
            .iter()
            .map(|url| self.rewrite_url(url))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn add_attribute_columns(table: &mut Table, slot: u8, name: &str, values: Vec<String>) {
    let mut values = values.into_iter();
    table.set_column(&format!("属性 {slot} 名称"), |_| name.to_string());
    table.set_column(&format!("属性 {slot} 值"), |_| values.next().unwrap_or_default());
    table.set_column(&format!("属性 {slot} 可见"), |_| "1".to_string());
    table.set_column(&format!("属性 {slot}  的全局"), |_| "0".to_string());
}

/// Moves `颜色` into the importer's first attribute slot.
pub fn color_attribute(table: &mut Table) -> bool {
    let Some(colors) = table.column_values(columns::COLOR) else {
        return false;
    };
    let values: Vec<String> = colors
        .into_iter()
        .map(|raw| fields::split_multi(raw).join(", "))
        .collect();

    add_attribute_columns(table, 1, "Color", values);
    table.drop_column(columns::COLOR);
    true
}

/// Strips the HTML fragments and option markup scraped into `规格`.
#[derive(Debug, Clone)]
pub struct SizeCleaner {
    tags: Regex,
    whitespace: Regex,
    value_attr: Regex,
    option_attr: Regex,
    bracketed: Regex,
    color_and_code: Regex,
    code: Regex,
}

impl SizeCleaner {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).with_context(|| format!("failed to compile pattern {pattern}"))
        };
        Ok(Self {
            tags: compile(r"<[^>]+>")?,
            whitespace: compile(r"\s+")?,
            value_attr: compile(r"value='[^']*'")?,
            option_attr: compile(r"data-option='[^']*'")?,
            bracketed: compile(r"\[[^\]]*\]")?,
            color_and_code: compile(r"([^/]+)\s*/\s*([A-Z0-9]+)")?,
            code: compile(r"([A-Z0-9]+)")?,
        })
    }

    fn scrub(&self, raw: &str) -> String {
        let text = self.tags.replace_all(raw, "");
        let text = self.whitespace.replace_all(&text, " ");
        let text = text.replace("disabled", "");
        let text = self.value_attr.replace_all(&text, "");
        let text = self.option_attr.replace_all(&text, "");
        let text = text
            .replace("删除", "")
            .replace("]'", "")
            .replace(']', "")
            .replace('\'', "");
        let text = self.bracketed.replace_all(&text, "");
        let text = text.replace(']', "").replace('[', "");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let text = self.scrub(raw);
        if text.is_empty() {
            return None;
        }

        if let Some(captures) = self.color_and_code.captures(&text) {
            let color = captures[1].trim();
            let code = captures[2].trim();
            return (!color.is_empty() && !code.is_empty()).then(|| format!("{color} / {code}"));
        }
        if let Some(captures) = self.code.captures(&text) {
            return Some(captures[1].to_string());
        }
        (text.chars().count() > 1 && !text.ends_with('/')).then_some(text)
    }

    /// Cleans each `|||` part, then dedupes and sorts the survivors.
    pub fn clean(&self, raw: &str) -> String {
        let sizes: BTreeSet<String> = fields::split_multi(raw)
            .iter()
            .filter_map(|part| self.normalize(part))
            .collect();
        sizes.into_iter().collect::<Vec<_>>().join(", ")
    }
}

/// Moves cleaned `规格` values into the importer's second attribute slot.
pub fn size_attribute(table: &mut Table, cleaner: &SizeCleaner) -> bool {
    let Some(sizes) = table.column_values(columns::SIZE) else {
        return false;
    };
    let values: Vec<String> = sizes.into_iter().map(|raw| cleaner.clean(raw)).collect();

    add_attribute_columns(table, 2, "Size", values);
    table.drop_column(columns::SIZE);
    true
}

/// Renames both price columns, or neither when one is missing.
pub fn rename_prices(table: &mut Table) -> bool {
    if !table.has_column(columns::REGULAR_PRICE) || !table.has_column(columns::SALE_PRICE) {
        return false;
    }
    table.rename_column(columns::REGULAR_PRICE, REGULAR_PRICE_OUT);
    table.rename_column(columns::SALE_PRICE, SALE_PRICE_OUT);
    true
}

/// Export-time filter for helper columns the scraper adds.
pub fn is_duplicate_column(name: &str) -> bool {
    name.contains("颜色重复") || name.to_lowercase().contains("duplicate")
}
