//! Decide which files need converting.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::ConvertFormat;
use crate::naming::BRSTM_EXT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertTask {
    /// 1-based position in the plan; skipped files come first.
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConvertTask {
    /// Display name: input file name without extension.
    pub fn name(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertPlan {
    pub total: usize,
    /// Outputs already present.
    pub skipped: Vec<ConvertTask>,
    pub pending: Vec<ConvertTask>,
}

/// `stem` + `.ext`, without `Path::with_extension` eating dots inside song titles.
fn output_name(stem: &std::ffi::OsStr, ext: &str) -> OsString {
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(ext);
    name
}

/// All `*.brstm` files in `input_dir`, sorted by name, split into skipped and pending.
pub fn plan_conversion(
    input_dir: &Path,
    output_dir: &Path,
    format: ConvertFormat,
) -> Result<ConvertPlan> {
    let mut inputs: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("read {}", input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == BRSTM_EXT))
        .collect();
    inputs.sort();

    let total = inputs.len();
    let mut skipped = Vec::new();
    let mut pending = Vec::new();
    for input in inputs {
        let Some(stem) = input.file_stem() else { continue };
        let output = output_dir.join(output_name(stem, format.extension()));
        if output.exists() {
            skipped.push((input, output));
        } else {
            pending.push((input, output));
        }
    }

    let to_tasks = |items: Vec<(PathBuf, PathBuf)>, start: usize| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (input, output))| ConvertTask {
                index: start + i,
                input,
                output,
            })
            .collect::<Vec<_>>()
    };
    let skipped_count = skipped.len();
    Ok(ConvertPlan {
        total,
        skipped: to_tasks(skipped, 1),
        pending: to_tasks(pending, skipped_count + 1),
    })
}
