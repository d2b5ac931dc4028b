//! Table enrichment: geocode a place column and attach coordinate columns.

mod naming;
mod splitter;

pub use naming::{coordinates_column, derived_column, CoordinateSuffix};
pub use splitter::{parse_coordinate_pair, split_coordinates};

use anyhow::{bail, Result};
use indicatif::ProgressBar;
use tracing::info;

use crate::geocode::{Geocoder, PlaceResolver};
use crate::models::{GenealogyTable, Resolution, Value};

/// Per-column outcome of an enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub column: String,
    pub rows: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub empty: usize,
}

/// Resolve every row of `column` and add `{column} COORDINATES`,
/// `{column} LATITUDE` and `{column} LONGITUDE`.
///
/// Rows are never added, removed or reordered. Blank cells skip the resolver
/// and leave all three derived cells null.
pub async fn enrich_column<G: Geocoder>(
    table: &mut GenealogyTable,
    column: &str,
    resolver: &mut PlaceResolver<G>,
    progress: Option<&ProgressBar>,
) -> Result<EnrichSummary> {
    let places: Vec<Option<String>> = match table.column(column) {
        Some(cells) => cells
            .map(|v| {
                if v.is_blank() {
                    None
                } else {
                    v.as_text().map(|t| t.into_owned())
                }
            })
            .collect(),
        None => bail!("missing column '{}'", column),
    };

    let mut summary = EnrichSummary {
        column: column.to_string(),
        rows: places.len(),
        ..Default::default()
    };

    let mut raw = Vec::with_capacity(places.len());
    for place in &places {
        let cell = match place {
            None => {
                summary.empty += 1;
                Value::Null
            }
            Some(place) => match resolver.resolve(place).await? {
                Resolution::Found(point) => {
                    summary.resolved += 1;
                    Value::Text(point.to_pair_string())
                }
                Resolution::NoResult => {
                    summary.unresolved += 1;
                    Value::Null
                }
            },
        };
        raw.push(cell);
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    table.set_column(&coordinates_column(column), raw)?;
    split_coordinates(table, column)?;

    info!(
        "Enriched '{}': {} resolved, {} unresolved, {} empty of {} rows",
        column, summary.resolved, summary.unresolved, summary.empty, summary.rows
    );
    Ok(summary)
}
