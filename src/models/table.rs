//! In-memory genealogy table.
//!
//! A `GenealogyTable` is created fresh from the exported CSV on every run,
//! gains coordinate columns during enrichment and is written wholesale into
//! the store. Rows share one ordered column list.

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, or text made only of whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form of the cell, `None` for null.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            Value::Real(f) => Some(Cow::Owned(f.to_string())),
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }

    /// Numeric form of the cell. Text is parsed leniently (trimmed).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }

    fn from_csv_field(field: &str) -> Self {
        if field.is_empty() {
            Value::Null
        } else {
            Value::Text(field.to_string())
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Real).unwrap_or(Value::Null)
    }
}

/// Declared storage type of a column, the widest among its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Uppercase, trim and replace spaces with underscores.
///
/// `"Birth place LATITUDE"` becomes `"BIRTH_PLACE_LATITUDE"`.
pub fn normalize_column_name(name: &str) -> String {
    name.to_uppercase().trim().replace(' ', "_")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenealogyTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl GenealogyTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Load the exported CSV from disk and infer column types.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        info!("Loading genealogy export from {}", path.display());
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        let table = Self::from_csv_reader(file)
            .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;
        info!(
            "Loaded {} rows with {} columns",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut table = Self::new(headers.iter().map(str::to_string).collect());

        for result in csv_reader.records() {
            let record = result?;
            table.push_row(record.iter().map(Value::from_csv_field).collect());
        }

        table.infer_types();
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column in row order
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Replace the contents of `name`, appending it if it does not exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            bail!(
                "Column '{}' has {} values but the table has {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Apply `normalize_column_name` to every column.
    pub fn normalize_column_names(&mut self) {
        for column in &mut self.columns {
            *column = normalize_column_name(column);
        }
    }

    pub fn column_type(&self, idx: usize) -> ColumnType {
        self.rows
            .iter()
            .filter_map(|row| match &row[idx] {
                Value::Null => None,
                Value::Integer(_) => Some(ColumnType::Integer),
                Value::Real(_) => Some(ColumnType::Real),
                Value::Text(_) => Some(ColumnType::Text),
            })
            .max()
            .unwrap_or(ColumnType::Text)
    }

    /// Promote text columns whose non-null cells are all numeric.
    pub fn infer_types(&mut self) {
        for idx in 0..self.columns.len() {
            let texts: Vec<&str> = self
                .rows
                .iter()
                .filter_map(|row| match &row[idx] {
                    Value::Text(s) => Some(s.trim()),
                    _ => None,
                })
                .collect();

            if texts.is_empty() {
                continue;
            }

            if texts.iter().all(|s| s.parse::<i64>().is_ok()) {
                for row in &mut self.rows {
                    if let Value::Text(s) = &row[idx] {
                        if let Ok(i) = s.trim().parse::<i64>() {
                            row[idx] = Value::Integer(i);
                        }
                    }
                }
            } else if texts
                .iter()
                .all(|s| s.parse::<f64>().map(f64::is_finite).unwrap_or(false))
            {
                for row in &mut self.rows {
                    if let Value::Text(s) = &row[idx] {
                        if let Ok(f) = s.trim().parse::<f64>() {
                            row[idx] = Value::Real(f);
                        }
                    }
                }
            }
        }
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
Full name,Birth place,Birth year,Height
Agim Nushi,\"gjakova, kosovo\",1950,1.82
Drita Nushi,,1955,
Besa Nushi,prishtina,,1.6
";

    #[test]
    fn test_csv_load_infers_types() {
        let table = GenealogyTable::from_csv_reader(EXPORT.as_bytes()).unwrap();

        assert_eq!(
            table.columns(),
            &["Full name", "Birth place", "Birth year", "Height"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get(0, "Birth place"),
            Some(&Value::Text("gjakova, kosovo".to_string()))
        );
        assert_eq!(table.get(1, "Birth place"), Some(&Value::Null));
        assert_eq!(table.get(0, "Birth year"), Some(&Value::Integer(1950)));
        assert_eq!(table.get(2, "Birth year"), Some(&Value::Null));
        assert_eq!(table.get(0, "Height"), Some(&Value::Real(1.82)));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let csv = "A,B,C\n1,2\n4,5,6,7\n";
        let table = GenealogyTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.get(0, "C"), Some(&Value::Null));
        assert_eq!(table.rows()[1].len(), 3);
    }

    #[test]
    fn test_normalize_column_names() {
        let mut table = GenealogyTable::new(vec![
            "Column 1".to_string(),
            "     Column2".to_string(),
            "Birth place LATITUDE".to_string(),
        ]);
        table.normalize_column_names();
        assert_eq!(
            table.columns(),
            &["COLUMN_1", "COLUMN2", "BIRTH_PLACE_LATITUDE"]
        );
    }

    #[test]
    fn test_set_column_appends_then_overwrites() {
        let mut table = GenealogyTable::new(vec!["A".to_string()]);
        table.push_row(vec![Value::Integer(1)]);
        table.push_row(vec![Value::Integer(2)]);

        table
            .set_column("B", vec![Value::Real(0.5), Value::Null])
            .unwrap();
        assert_eq!(table.columns(), &["A", "B"]);

        table
            .set_column("B", vec![Value::Null, Value::Real(1.5)])
            .unwrap();
        assert_eq!(table.columns(), &["A", "B"]);
        assert_eq!(table.get(1, "B"), Some(&Value::Real(1.5)));

        assert!(table.set_column("C", vec![Value::Null]).is_err());
    }

    #[test]
    fn test_column_type_is_widest() {
        let mut table = GenealogyTable::new(vec!["A".into(), "B".into(), "C".into()]);
        table.push_row(vec![Value::Integer(1), Value::Integer(1), Value::Null]);
        table.push_row(vec![Value::Real(1.5), Value::Text("x".into()), Value::Null]);

        assert_eq!(table.column_type(0), ColumnType::Real);
        assert_eq!(table.column_type(1), ColumnType::Text);
        assert_eq!(table.column_type(2), ColumnType::Text);
    }
}
