//! BRSTM -> WAV -> ALAC/FLAC conversion through external tools.
//!
//! `vgmstream-cli` decodes each BRSTM into a temporary WAV next to the
//! output, then `ffmpeg` encodes the target codec. Files run in parallel, one
//! task per worker, each awaiting its two processes in sequence.

mod plan;
mod run;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ScmConfig;
use crate::error::ItemError;

pub use plan::{plan_conversion, ConvertPlan, ConvertTask};
pub use run::{convert_all, convert_file};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertFormat {
    /// Apple Lossless in an `.m4a` container.
    #[default]
    Alac,
    Flac,
    /// Decoder output kept as-is; no transcoder run.
    Wav,
}

impl ConvertFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ConvertFormat::Alac => "m4a",
            ConvertFormat::Flac => "flac",
            ConvertFormat::Wav => "wav",
        }
    }

    /// `ffmpeg -c:a` codec, or `None` when the WAV is the final output.
    pub fn codec(self) -> Option<&'static str> {
        match self {
            ConvertFormat::Alac => Some("alac"),
            ConvertFormat::Flac => Some("flac"),
            ConvertFormat::Wav => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConvertFormat::Alac => "ALAC",
            ConvertFormat::Flac => "FLAC",
            ConvertFormat::Wav => "WAV",
        }
    }
}

impl fmt::Display for ConvertFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConvertFormat::Alac => "alac",
            ConvertFormat::Flac => "flac",
            ConvertFormat::Wav => "wav",
        })
    }
}

impl FromStr for ConvertFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alac" | "m4a" => Ok(ConvertFormat::Alac),
            "flac" => Ok(ConvertFormat::Flac),
            "wav" => Ok(ConvertFormat::Wav),
            other => Err(format!("unknown format '{}' (expected alac, flac or wav)", other)),
        }
    }
}

/// Locations of the two external tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub vgmstream: PathBuf,
    pub ffmpeg: PathBuf,
}

impl ToolPaths {
    pub fn from_config(cfg: &ScmConfig) -> Self {
        Self {
            vgmstream: cfg.paths.vgmstream.clone(),
            ffmpeg: cfg.paths.ffmpeg.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ConvertOutcome {
    Converted,
    /// Output already present.
    Skipped,
    Failed(ItemError),
}

#[derive(Debug)]
pub struct ConvertReport {
    /// 1-based position of the file in the plan.
    pub index: usize,
    pub total: usize,
    pub name: String,
    pub outcome: ConvertOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ConvertSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Wall time of the conversion phase (skips excluded).
    pub elapsed: Duration,
}

impl ConvertSummary {
    fn record(&mut self, outcome: &ConvertOutcome) {
        match outcome {
            ConvertOutcome::Converted => self.converted += 1,
            ConvertOutcome::Skipped => self.skipped += 1,
            ConvertOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Files that were attempted this run.
    pub fn attempted(&self) -> usize {
        self.converted + self.failed
    }
}

/// Resolve a tool path: paths with a directory part must exist as given,
/// bare names are searched on `PATH`.
pub fn resolve_tool(tool: &Path) -> Option<PathBuf> {
    if tool.components().count() > 1 || tool.is_absolute() {
        return tool.is_file().then(|| tool.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

/// Fail fast when a tool or the input directory is missing.
pub async fn check_dependencies(
    tools: &ToolPaths,
    input_dir: &Path,
    format: ConvertFormat,
) -> Result<()> {
    if resolve_tool(&tools.vgmstream).is_none() {
        anyhow::bail!(
            "vgmstream-cli not found at {} (run `scmdl tools` to fetch it)",
            tools.vgmstream.display()
        );
    }
    if !input_dir.is_dir() {
        anyhow::bail!("input directory {} not found", input_dir.display());
    }
    if format.codec().is_some() {
        let ok = tokio::process::Command::new(&tools.ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);
        if !ok {
            anyhow::bail!(
                "{} not found or not working; install ffmpeg for {} conversion \
                 (e.g. `brew install ffmpeg` or `apt install ffmpeg`)",
                tools.ffmpeg.display(),
                format.label()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_extensions_and_codecs() {
        assert_eq!(ConvertFormat::Alac.extension(), "m4a");
        assert_eq!(ConvertFormat::Alac.codec(), Some("alac"));
        assert_eq!(ConvertFormat::Flac.extension(), "flac");
        assert_eq!(ConvertFormat::Flac.codec(), Some("flac"));
        assert_eq!(ConvertFormat::Wav.codec(), None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("ALAC".parse::<ConvertFormat>(), Ok(ConvertFormat::Alac));
        assert_eq!("m4a".parse::<ConvertFormat>(), Ok(ConvertFormat::Alac));
        assert_eq!("flac".parse::<ConvertFormat>(), Ok(ConvertFormat::Flac));
        assert!("mp3".parse::<ConvertFormat>().is_err());
        assert_eq!(ConvertFormat::Flac.to_string(), "flac");
    }

    #[test]
    fn resolve_tool_with_directory_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("vgmstream-cli");
        assert!(resolve_tool(&tool).is_none());
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();
        assert_eq!(resolve_tool(&tool), Some(tool));
    }

    #[test]
    fn resolve_tool_bare_name_not_on_path() {
        assert!(resolve_tool(Path::new("definitely-not-a-real-tool-4f9c")).is_none());
    }

    #[tokio::test]
    async fn missing_extractor_is_reported_first() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            vgmstream: dir.path().join("missing-vgmstream"),
            ffmpeg: PathBuf::from("ffmpeg"),
        };
        let err = check_dependencies(&tools, dir.path(), ConvertFormat::Alac)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("vgmstream-cli not found"));
    }

    #[tokio::test]
    async fn missing_input_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let vgm = dir.path().join("vgmstream-cli");
        std::fs::write(&vgm, b"").unwrap();
        let tools = ToolPaths {
            vgmstream: vgm,
            ffmpeg: PathBuf::from("ffmpeg"),
        };
        let err = check_dependencies(&tools, &dir.path().join("nope"), ConvertFormat::Wav)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("input directory"));
    }
}
