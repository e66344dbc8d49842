//! Compare downloaded BRSTM files against the live listing.
//!
//! Checks names (missing/extra), the overall count, and flags files small
//! enough to be a saved HTML error page rather than audio.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::VerifyConfig;
use crate::naming::{song_filename, BRSTM_EXT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeStats {
    pub total: u64,
    pub average: f64,
    pub min: u64,
    pub max: u64,
}

impl SizeStats {
    pub fn from_sizes(sizes: &[u64]) -> Self {
        if sizes.is_empty() {
            return Self::default();
        }
        let total: u64 = sizes.iter().sum();
        Self {
            total,
            average: total as f64 / sizes.len() as f64,
            min: sizes.iter().copied().min().unwrap_or(0),
            max: sizes.iter().copied().max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Songs on the live listing.
    pub expected: usize,
    /// Configured exact count, if any.
    pub expected_count: Option<usize>,
    /// `*.brstm` files on disk, sorted by name.
    pub found: Vec<FoundFile>,
    /// Expected filenames with no file on disk, sorted.
    pub missing: Vec<String>,
    /// Files on disk not on the listing, sorted.
    pub extra: Vec<String>,
    pub sizes: SizeStats,
    /// Files below the small-file threshold.
    pub small_files: Vec<FoundFile>,
}

impl VerifyReport {
    /// Count the listing and the disk must both reach.
    pub fn target_count(&self) -> usize {
        self.expected_count.unwrap_or(self.expected)
    }

    pub fn count_ok(&self) -> bool {
        let target = self.target_count();
        self.expected == self.found.len() && self.found.len() == target
    }

    pub fn names_ok(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    pub fn passed(&self) -> bool {
        self.count_ok() && self.names_ok() && self.small_files.is_empty()
    }
}

/// Filenames the listing maps to on disk.
pub fn expected_filenames(names: &[String]) -> BTreeSet<String> {
    names.iter().map(|n| song_filename(n, BRSTM_EXT)).collect()
}

fn list_brstm(dir: &Path) -> Result<Vec<FoundFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.extension().is_some_and(|e| e == BRSTM_EXT) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        files.push(FoundFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: meta.len(),
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Build the report for `dir` against the song names of the listing.
pub fn build_report(
    expected_names: &[String],
    dir: &Path,
    settings: &VerifyConfig,
) -> Result<VerifyReport> {
    if !dir.is_dir() {
        anyhow::bail!("download directory '{}' not found", dir.display());
    }
    let found = list_brstm(dir)?;

    let expected_set = expected_filenames(expected_names);
    let found_set: BTreeSet<String> = found.iter().map(|f| f.name.clone()).collect();
    let missing = expected_set.difference(&found_set).cloned().collect();
    let extra = found_set.difference(&expected_set).cloned().collect();

    let sizes: Vec<u64> = found.iter().map(|f| f.size).collect();
    let small_files = found
        .iter()
        .filter(|f| f.size < settings.small_file_bytes)
        .cloned()
        .collect();

    let report = VerifyReport {
        expected: expected_names.len(),
        expected_count: settings.expected_count,
        sizes: SizeStats::from_sizes(&sizes),
        found,
        missing,
        extra,
        small_files,
    };
    tracing::info!(
        expected = report.expected,
        found = report.found.len(),
        missing = report.missing.len(),
        extra = report.extra.len(),
        small = report.small_files.len(),
        "verification finished"
    );
    Ok(report)
}
