//! Split `"(lat, lon)"` text into numeric latitude and longitude columns.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;

use super::naming::{coordinates_column, derived_column, CoordinateSuffix};
use crate::models::{GenealogyTable, Value};

static PAIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^,]+),\s*([^)]+)\)").expect("valid coordinate pattern"));

/// Extract both halves of a `"(lat, lon)"` string.
///
/// Both halves must be finite numbers; otherwise, or when the text does not
/// hold the pattern, the result is `(None, None)`.
pub fn parse_coordinate_pair(text: &str) -> (Option<f64>, Option<f64>) {
    let Some(caps) = PAIR_PATTERN.captures(text) else {
        return (None, None);
    };
    match (parse_number(&caps[1]), parse_number(&caps[2])) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Materialize `{base} LATITUDE` and `{base} LONGITUDE` from
/// `{base} COORDINATES`, overwriting earlier values.
pub fn split_coordinates(table: &mut GenealogyTable, base: &str) -> Result<()> {
    let source = coordinates_column(base);
    let (lats, lons): (Vec<Value>, Vec<Value>) = table
        .column(&source)
        .with_context(|| format!("Missing coordinates column '{}'", source))?
        .map(|value| {
            let (lat, lon) = value
                .as_text()
                .map(|text| parse_coordinate_pair(&text))
                .unwrap_or((None, None));
            (Value::from(lat), Value::from(lon))
        })
        .unzip();

    table.set_column(&derived_column(base, CoordinateSuffix::Latitude), lats)?;
    table.set_column(&derived_column(base, CoordinateSuffix::Longitude), lons)?;
    Ok(())
}
