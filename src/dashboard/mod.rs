//! Read-only views over the stored table: column profiles, row filters and
//! map points.

mod filter;
mod map;
mod profile;

pub use filter::{apply_filters, Filter, FilterError};
pub use map::{
    checked_jitter, coordinate_columns, filter_by_name, jitter, PointFeature, DEFAULT_JITTER,
    MAX_JITTER,
};
pub use profile::{profile_table, ColumnProfile, ColumnSummary, CATEGORICAL_LIMIT};

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::Value;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d %B %Y", "%d %b %Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Date held in a text cell, if it reads as one.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let Value::Text(text) = value else {
        return None;
    };
    let text = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}
