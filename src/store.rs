//! SQLite persistence for the enriched genealogy table.
//!
//! Every operation opens its own connection right before use and closes it
//! on both the success and the error path before returning.

use anyhow::{bail, Context, Result};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row, Sqlite, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{GenealogyTable, GeoPoint, PersonLocation, Value};

/// Lookup failures callers may want to tell apart from I/O errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table '{0}' does not exist")]
    MissingTable(String),

    #[error("column '{0}' does not exist")]
    MissingColumn(String),
}

/// One named table in one SQLite file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    table: String,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P, table: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: table.to_string(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self, writable: bool) -> Result<SqliteConnection> {
        debug!("Connecting to database '{}'", self.path.display());
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(writable)
            .read_only(!writable);
        SqliteConnection::connect_with(&options)
            .await
            .with_context(|| format!("Failed to open database: {}", self.path.display()))
    }

    /// Drop and recreate the table from `table`, inside one transaction.
    pub async fn replace_table(&self, table: &GenealogyTable) -> Result<()> {
        info!(
            "Replacing table '{}' in '{}' with {} rows",
            self.table,
            self.path.display(),
            table.len()
        );

        let mut conn = self.connect(true).await?;
        let written = write_table(&mut conn, &self.table, table).await;
        let closed = conn.close().await.context("Failed to close database connection");

        written.with_context(|| format!("Failed to write table '{}'", self.table))?;
        closed?;
        debug!("Closed connection to database");
        Ok(())
    }

    /// Read the whole table back, columns in stored order.
    pub async fn read_table(&self) -> Result<GenealogyTable> {
        let mut conn = self.connect(false).await?;
        let read = fetch_table(&mut conn, &self.table).await;
        let closed = conn.close().await.context("Failed to close database connection");

        let table = read?;
        closed?;
        Ok(table)
    }

    /// Rows with both coordinates present, labelled by `name_column`.
    pub async fn read_points(
        &self,
        name_column: &str,
        lat_column: &str,
        lon_column: &str,
    ) -> Result<Vec<PersonLocation>> {
        let mut conn = self.connect(false).await?;
        let read = fetch_points(&mut conn, &self.table, name_column, lat_column, lon_column).await;
        let closed = conn.close().await.context("Failed to close database connection");

        let points = read?;
        closed?;
        Ok(points)
    }

    pub async fn table_exists(&self) -> Result<bool> {
        let mut conn = self.connect(false).await?;
        let exists = table_columns(&mut conn, &self.table)
            .await
            .map(|columns| !columns.is_empty());
        let closed = conn.close().await.context("Failed to close database connection");

        let exists = exists?;
        closed?;
        Ok(exists)
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

async fn write_table(
    conn: &mut SqliteConnection,
    name: &str,
    table: &GenealogyTable,
) -> Result<()> {
    if table.columns().is_empty() {
        bail!("Cannot store a table without columns");
    }

    let quoted = quote_identifier(name);
    let definitions = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            format!(
                "{} {}",
                quote_identifier(column),
                table.column_type(idx).sql_name()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let column_list = table
        .columns()
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; table.columns().len()].join(", ");

    let mut tx = conn.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quoted))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("CREATE TABLE {} ({})", quoted, definitions))
        .execute(&mut *tx)
        .await?;

    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted, column_list, placeholders
    );
    for row in table.rows() {
        let mut query = sqlx::query(&insert);
        for value in row {
            query = bind_value(query, value);
        }
        query.execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(i) => query.bind(*i),
        Value::Real(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
    }
}

async fn table_columns(conn: &mut SqliteConnection, name: &str) -> Result<Vec<String>> {
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(name)
            .fetch_all(&mut *conn)
            .await?;
    Ok(columns)
}

async fn fetch_table(conn: &mut SqliteConnection, name: &str) -> Result<GenealogyTable> {
    let columns = table_columns(conn, name).await?;
    if columns.is_empty() {
        return Err(StoreError::MissingTable(name.to_string()).into());
    }

    let rows = sqlx::query(&format!("SELECT * FROM {}", quote_identifier(name)))
        .fetch_all(&mut *conn)
        .await?;

    let mut table = GenealogyTable::new(columns);
    for row in &rows {
        let cells = (0..row.len())
            .map(|idx| decode_cell(row, idx))
            .collect::<Result<Vec<_>>>()?;
        table.push_row(cells);
    }
    Ok(table)
}

async fn fetch_points(
    conn: &mut SqliteConnection,
    name: &str,
    name_column: &str,
    lat_column: &str,
    lon_column: &str,
) -> Result<Vec<PersonLocation>> {
    let columns = table_columns(conn, name).await?;
    if columns.is_empty() {
        return Err(StoreError::MissingTable(name.to_string()).into());
    }
    for required in [name_column, lat_column, lon_column] {
        if !columns.iter().any(|c| c == required) {
            return Err(StoreError::MissingColumn(required.to_string()).into());
        }
    }

    let (lat, lon) = (quote_identifier(lat_column), quote_identifier(lon_column));
    let sql = format!(
        "SELECT {}, {}, {} FROM {} WHERE {} IS NOT NULL AND {} IS NOT NULL",
        quote_identifier(name_column),
        lat,
        lon,
        quote_identifier(name),
        lat,
        lon
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    let mut points = Vec::with_capacity(rows.len());
    for row in &rows {
        let name = decode_cell(row, 0)?.as_text().map(|t| t.into_owned());
        let lat = decode_cell(row, 1)?.as_f64();
        let lon = decode_cell(row, 2)?.as_f64();
        if let (Some(lat), Some(lon)) = (lat, lon) {
            points.push(PersonLocation {
                name,
                location: GeoPoint::new(lat, lon),
            });
        }
    }
    Ok(points)
}

/// Decode a cell by the storage class of the stored value.
fn decode_cell(row: &SqliteRow, idx: usize) -> Result<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" => Value::Integer(row.try_get::<i64, _>(idx)?),
        "REAL" => Value::Real(row.try_get::<f64, _>(idx)?),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            Value::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::Text(row.try_get::<String, _>(idx)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> GenealogyTable {
        let mut table = GenealogyTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("NUSHI"), "\"NUSHI\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[tokio::test]
    async fn test_write_then_read_back() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("family.db"), "NUSHI");

        let written = table(
            &["FULL_NAME", "BIRTH_YEAR", "BIRTH_PLACE_LATITUDE"],
            vec![
                vec![text("Agim Nushi"), Value::Integer(1950), Value::Real(42.3803)],
                vec![text("Drita Nushi"), Value::Null, Value::Null],
            ],
        );
        store.replace_table(&written).await.unwrap();

        let read = store.read_table().await.unwrap();
        assert_eq!(read, written);
        assert!(store.table_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_drops_previous_schema() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("family.db"), "NUSHI");

        let first = table(
            &["A", "B"],
            vec![
                vec![text("a1"), text("b1")],
                vec![text("a2"), text("b2")],
            ],
        );
        let second = table(&["A", "B", "C"], vec![vec![text("x"), text("y"), Value::Real(1.5)]]);

        store.replace_table(&first).await.unwrap();
        store.replace_table(&second).await.unwrap();

        let read = store.read_table().await.unwrap();
        assert_eq!(read.columns(), &["A", "B", "C"]);
        assert_eq!(read.len(), 1);
        assert_eq!(read, second);
    }

    #[tokio::test]
    async fn test_read_points_skips_missing_coordinates() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("family.db"), "NUSHI");

        let written = table(
            &["FULL_NAME", "ADDRESS_LATITUDE", "ADDRESS_LONGITUDE"],
            vec![
                vec![text("Agim"), Value::Real(42.66), Value::Real(21.17)],
                vec![text("Drita"), Value::Null, Value::Null],
                vec![text("Besa"), Value::Real(42.38), Value::Null],
            ],
        );
        store.replace_table(&written).await.unwrap();

        let points = store
            .read_points("FULL_NAME", "ADDRESS_LATITUDE", "ADDRESS_LONGITUDE")
            .await
            .unwrap();
        assert_eq!(
            points,
            vec![PersonLocation {
                name: Some("Agim".to_string()),
                location: GeoPoint::new(42.66, 21.17),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_table_and_column_are_typed() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("family.db"), "NUSHI");
        store
            .replace_table(&table(&["FULL_NAME"], vec![vec![text("Agim")]]))
            .await
            .unwrap();

        let err = store
            .read_points("FULL_NAME", "BIRTH_PLACE_LATITUDE", "BIRTH_PLACE_LONGITUDE")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::MissingColumn(c)) if c == "BIRTH_PLACE_LATITUDE"
        ));

        let other = SqliteStore::new(dir.path().join("family.db"), "OTHER");
        let err = other.read_table().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::MissingTable(_))
        ));
        assert!(!other.table_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_reading_missing_database_fails() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"), "NUSHI");
        assert!(store.read_table().await.is_err());
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_table() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("family.db"), "NUSHI");
        let first = table(&["A"], vec![vec![text("kept")]]);
        store.replace_table(&first).await.unwrap();

        // Duplicate column names make CREATE TABLE fail inside the transaction
        let broken = table(&["A", "A"], vec![vec![text("x"), text("y")]]);
        assert!(store.replace_table(&broken).await.is_err());

        assert_eq!(store.read_table().await.unwrap(), first);
    }
}
