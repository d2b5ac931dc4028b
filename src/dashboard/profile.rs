use chrono::NaiveDate;
use hashbrown::HashSet;
use serde::Serialize;

use super::parse_date;
use crate::models::{ColumnType, GenealogyTable, Value};

/// Columns with fewer distinct values than this are offered as a pick list.
pub const CATEGORICAL_LIMIT: usize = 10;

/// How a dashboard should offer filtering on a column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnProfile {
    /// Distinct values in order of first appearance, `null` included
    Categorical { values: Vec<Option<String>> },
    Numeric { min: f64, max: f64 },
    Date { min: NaiveDate, max: NaiveDate },
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    #[serde(flatten)]
    pub profile: ColumnProfile,
}

pub fn profile_table(table: &GenealogyTable) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<_> = table.rows().iter().map(|row| &row[idx]).collect();
            let non_null = cells.iter().filter(|v| !v.is_null()).count();

            let mut seen = HashSet::new();
            let mut distinct = Vec::new();
            for cell in &cells {
                let key = cell.as_text().map(|t| t.into_owned());
                if seen.insert(key.clone()) {
                    distinct.push(key);
                }
            }
            let distinct_non_null = distinct.iter().filter(|v| v.is_some()).count();

            let profile = if distinct_non_null < CATEGORICAL_LIMIT {
                ColumnProfile::Categorical { values: distinct }
            } else if table.column_type(idx) != ColumnType::Text {
                numeric_profile(&cells).unwrap_or(ColumnProfile::Text)
            } else {
                date_profile(&cells).unwrap_or(ColumnProfile::Text)
            };

            ColumnSummary {
                name: name.clone(),
                non_null,
                profile,
            }
        })
        .collect()
}

fn numeric_profile(cells: &[&Value]) -> Option<ColumnProfile> {
    let values: Vec<f64> = cells.iter().filter_map(|v| v.as_f64()).collect();
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    Some(ColumnProfile::Numeric { min, max })
}

fn date_profile(cells: &[&Value]) -> Option<ColumnProfile> {
    let mut dates = Vec::new();
    for cell in cells.iter().filter(|v| !v.is_null()) {
        dates.push(parse_date(cell)?);
    }
    let min = *dates.iter().min()?;
    let max = *dates.iter().max()?;
    Some(ColumnProfile::Date { min, max })
}
