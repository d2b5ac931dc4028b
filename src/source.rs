//! Locate the downloaded genealogy export and give it its canonical name.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Result of looking for a fresh export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFile {
    /// The first matching download, now at its canonical path
    Renamed(PathBuf),
    /// No download matched; nothing to do
    NotFound,
}

/// `"nUSHI"` -> `"Nushi"`
pub fn canonical_family_name(family: &str) -> String {
    let mut chars = family.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `{Family}-Genealogy.csv`
pub fn canonical_file_name(family: &str) -> String {
    format!("{}-Genealogy.csv", canonical_family_name(family))
}

/// Rename the first `{Family}-Genealogy-*.csv` in `dir` (by file name order)
/// to `{Family}-Genealogy.csv`, replacing any earlier canonical file.
pub fn normalize_export(dir: &Path, family: &str) -> Result<ExportFile> {
    let family = canonical_family_name(family);
    let pattern = Regex::new(&format!(r"^{}-Genealogy-.*\.csv$", regex::escape(&family)))
        .context("Failed to build export file pattern")?;

    let mut matches = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if pattern.is_match(name) {
                matches.push(entry.into_path());
            }
        }
    }

    let Some(file) = matches.first() else {
        warn!(
            "No matching files found for family name '{}' in {}",
            family,
            dir.display()
        );
        return Ok(ExportFile::NotFound);
    };

    if matches.len() > 1 {
        warn!(
            "{} exports match, only processing {}",
            matches.len(),
            file.display()
        );
    }

    let target = dir.join(canonical_file_name(&family));
    fs::rename(file, &target).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            file.display(),
            target.display()
        )
    })?;
    info!("Renamed '{}' to '{}'", file.display(), target.display());

    Ok(ExportFile::Renamed(target))
}
