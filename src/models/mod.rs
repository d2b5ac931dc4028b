//! Core data models for the genealogy pipeline.

pub mod place;
pub mod table;

pub use place::{GeoPoint, PersonLocation, Resolution};
pub use table::{normalize_column_name, ColumnType, GenealogyTable, Value};
