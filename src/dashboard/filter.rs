use chrono::NaiveDate;
use hashbrown::HashSet;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::parse_date;
use crate::models::{GenealogyTable, Value};

/// One row filter; a request's filters all have to match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Cell text is one of `values`; `null` selects empty cells
    OneOf {
        column: String,
        values: Vec<Option<String>>,
    },
    /// Numeric cell within `[min, max]`
    Range {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Date cell within `[start, end]`
    DateRange {
        column: String,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Regex search in the cell text
    Contains { column: String, pattern: String },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::OneOf { column, .. }
            | Filter::Range { column, .. }
            | Filter::DateRange { column, .. }
            | Filter::Contains { column, .. } => column,
        }
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("invalid pattern for column '{column}': {source}")]
    InvalidPattern {
        column: String,
        #[source]
        source: regex::Error,
    },
}

enum Predicate {
    OneOf {
        values: HashSet<String>,
        include_null: bool,
    },
    Range(Option<f64>, Option<f64>),
    DateRange(Option<NaiveDate>, Option<NaiveDate>),
    Matches(Regex),
}

impl Predicate {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::OneOf {
                values,
                include_null,
            } => match value.as_text() {
                Some(text) => values.contains(&*text),
                None => *include_null,
            },
            Predicate::Range(min, max) => value
                .as_f64()
                .map(|v| within(v, *min, *max))
                .unwrap_or(false),
            Predicate::DateRange(start, end) => parse_date(value)
                .map(|d| within(d, *start, *end))
                .unwrap_or(false),
            Predicate::Matches(re) => value
                .as_text()
                .map(|text| re.is_match(&text))
                .unwrap_or(false),
        }
    }
}

fn within<T: PartialOrd>(v: T, low: Option<T>, high: Option<T>) -> bool {
    low.map_or(true, |low| v >= low) && high.map_or(true, |high| v <= high)
}

/// Rows of `table` matching every filter, in their original order.
pub fn apply_filters(
    table: &GenealogyTable,
    filters: &[Filter],
) -> Result<GenealogyTable, FilterError> {
    let mut compiled = Vec::with_capacity(filters.len());
    for filter in filters {
        let idx = table
            .column_index(filter.column())
            .ok_or_else(|| FilterError::UnknownColumn(filter.column().to_string()))?;

        let predicate = match filter {
            Filter::OneOf { values, .. } => Predicate::OneOf {
                values: values.iter().flatten().cloned().collect(),
                include_null: values.iter().any(Option::is_none),
            },
            Filter::Range { min, max, .. } => Predicate::Range(*min, *max),
            Filter::DateRange { start, end, .. } => Predicate::DateRange(*start, *end),
            Filter::Contains { column, pattern } => {
                let re = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                    column: column.clone(),
                    source,
                })?;
                Predicate::Matches(re)
            }
        };
        compiled.push((idx, predicate));
    }

    let mut filtered = table.clone();
    filtered.retain_rows(|row| compiled.iter().all(|(idx, p)| p.matches(&row[*idx])));
    Ok(filtered)
}
