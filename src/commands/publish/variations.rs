use crate::config::FieldToggles;
use crate::content::ContentRow;
use crate::fields;
use crate::model::columns;
use crate::woo::{VariationAttribute, VariationPayload};

use super::payload::{single_value, stock_quantity};

/// One variation per color × size pair, or per value when only one
/// dimension is present. Prices and stock repeat the parent row.
pub fn variation_payloads(row: &ContentRow, toggles: &FieldToggles) -> Vec<VariationPayload> {
    let colors = multi_values(row, columns::COLOR, toggles.color);
    let sizes = multi_values(row, columns::SIZE, toggles.size);

    let combinations: Vec<Vec<VariationAttribute>> = match (colors.is_empty(), sizes.is_empty()) {
        (true, true) => return Vec::new(),
        (false, false) => colors
            .iter()
            .flat_map(|color| {
                sizes
                    .iter()
                    .map(move |size| vec![attribute("Color", color), attribute("Size", size)])
            })
            .collect(),
        (false, true) => colors.iter().map(|color| vec![attribute("Color", color)]).collect(),
        (true, false) => sizes.iter().map(|size| vec![attribute("Size", size)]).collect(),
    };

    let regular_price = toggles
        .regular_price
        .then(|| single_value(row, columns::REGULAR_PRICE))
        .flatten();
    let sale_price = toggles
        .sale_price
        .then(|| single_value(row, columns::SALE_PRICE))
        .flatten();
    let stock = toggles.stock.then(|| stock_quantity(row)).flatten();

    combinations
        .into_iter()
        .map(|attributes| VariationPayload {
            regular_price: regular_price.clone(),
            sale_price: sale_price.clone(),
            manage_stock: stock.map(|_| true),
            stock_quantity: stock,
            attributes,
        })
        .collect()
}

fn multi_values(row: &ContentRow, column: &str, enabled: bool) -> Vec<String> {
    if !enabled {
        return Vec::new();
    }
    row.get(column).map(fields::split_multi).unwrap_or_default()
}

fn attribute(name: &str, option: &str) -> VariationAttribute {
    VariationAttribute {
        name: name.to_string(),
        option: option.to_string(),
    }
}
