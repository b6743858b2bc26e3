//! Helpers for the `|||`-delimited multi-value text the scraper writes.

use std::collections::HashSet;

pub const SEPARATOR: &str = "|||";

/// Splits on `|||`, trimming each part and dropping empty ones.
pub fn split_multi(raw: &str) -> Vec<String> {
    raw.split(SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// First non-empty `|||` part, or an empty string.
pub fn first_value(raw: &str) -> String {
    raw.split(SEPARATOR)
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn join_multi<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Keeps the first occurrence of each value, preserving order.
pub fn dedupe_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Formats a category path for the WooCommerce CSV importer.
///
/// `A|||B|||C` becomes `A > B, A > B > C, A`.
pub fn nested_category_text(raw: &str) -> String {
    let parts = split_multi(raw);
    let Some(first) = parts.first() else {
        return String::new();
    };

    let mut entries: Vec<String> = (1..parts.len())
        .map(|depth| parts[..=depth].join(" > "))
        .collect();
    entries.push(first.clone());

    dedupe_in_order(entries).join(", ")
}

pub fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
