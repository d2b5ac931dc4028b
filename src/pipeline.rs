//! Ingest orchestration: load the export, enrich it, store it.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};

use crate::enrich::{enrich_column, EnrichSummary};
use crate::geocode::{Geocoder, PlaceResolver, ResolverStats};
use crate::models::GenealogyTable;
use crate::store::SqliteStore;

/// What one ingest run did
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub rows: usize,
    pub columns: Vec<EnrichSummary>,
    pub skipped_columns: Vec<String>,
    pub resolver: ResolverStats,
}

impl IngestReport {
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("Stored **{}** rows.", self.rows)];
        for summary in &self.columns {
            lines.push(format!(
                "{}: {} resolved, {} unresolved, {} empty",
                summary.column, summary.resolved, summary.unresolved, summary.empty
            ));
        }
        if !self.skipped_columns.is_empty() {
            lines.push(format!("Skipped: {}", self.skipped_columns.join(", ")));
        }
        lines.push(format!("Geocoder: {}", self.resolver));
        lines.join("\n")
    }
}

fn column_progress(rows: usize, column: &str, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(rows as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    pb.set_message(column.to_string());
    Ok(pb)
}

/// Enrich each configured column that exists in `table`, then normalize the
/// column names. Returns the per-column summaries and the skipped columns.
pub async fn enrich_table<G: Geocoder>(
    table: &mut GenealogyTable,
    columns: &[String],
    resolver: &mut PlaceResolver<G>,
    show_progress: bool,
) -> Result<(Vec<EnrichSummary>, Vec<String>)> {
    let mut summaries = Vec::new();
    let mut skipped = Vec::new();

    for column in columns {
        if !table.has_column(column) {
            warn!("Column '{}' not in export, skipping", column);
            skipped.push(column.clone());
            continue;
        }

        let pb = column_progress(table.len(), column, show_progress)?;
        let summary = enrich_column(table, column, resolver, Some(&pb)).await;
        pb.finish_and_clear();
        summaries.push(summary?);
    }

    info!("Normalizing column names...");
    table.normalize_column_names();

    Ok((summaries, skipped))
}

/// Load `csv`, enrich it and replace the stored table.
pub async fn ingest_file<G: Geocoder>(
    csv: &Path,
    columns: &[String],
    resolver: &mut PlaceResolver<G>,
    store: &SqliteStore,
    show_progress: bool,
) -> Result<IngestReport> {
    let mut table = GenealogyTable::from_csv_path(csv)?;
    let (summaries, skipped) = enrich_table(&mut table, columns, resolver, show_progress).await?;

    store.replace_table(&table).await?;

    let report = IngestReport {
        rows: table.len(),
        columns: summaries,
        skipped_columns: skipped,
        resolver: resolver.stats(),
    };
    info!("Geocoder: {}", report.resolver);
    Ok(report)
}
