use anyhow::{Context, Result};
use regex::Regex;

use crate::fields;

/// Separates size tokens such as `XL` or `2X` from raw color text.
#[derive(Debug, Clone)]
pub struct SizeExtractor {
    pattern: Regex,
}

impl SizeExtractor {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"(?i)(?:^|[\s/])([0-9]+X|X{1,3}S?|S|M|L|OS)(?:$|[\s|])")
            .context("failed to compile size pattern")?;
        Ok(Self { pattern })
    }

    /// Returns `(colors, sizes)`, both `|||`-joined and deduplicated in order.
    pub fn split(&self, raw: &str) -> (String, String) {
        let mut colors = Vec::new();
        let mut sizes = Vec::new();

        for part in fields::split_multi(raw) {
            if let Some(captures) = self.pattern.captures(&part) {
                sizes.push(captures[1].to_uppercase());
            }

            let color = self.pattern.replace_all(&part, "");
            let color = color.trim_matches(|c| c == ' ' || c == '/');
            if !color.is_empty() {
                colors.push(color.to_string());
            }
        }

        (
            fields::join_multi(&fields::dedupe_in_order(colors)),
            fields::join_multi(&fields::dedupe_in_order(sizes)),
        )
    }
}
