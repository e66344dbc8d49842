//! CLI for scmdl.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scmdl_core::config;
use scmdl_core::convert::ConvertFormat;
use std::path::PathBuf;

use commands::{run_convert, run_download, run_tools, run_urls, run_verify};

/// Top-level CLI: scrape, download, convert and verify a game soundtrack.
#[derive(Debug, Parser)]
#[command(name = "scmdl")]
#[command(about = "scmdl: soundtrack scraper, BRSTM downloader and converter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Write a URL list, a wget script and an aria2c input file for the listing.
    Urls {
        /// Leave out the fan-made remix section of the listing.
        #[arg(long)]
        exclude_remixes: bool,
    },

    /// Download every song of the listing as BRSTM.
    Download {
        /// Concurrent downloads (default from config, normally 1).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Do not ask for confirmation before starting.
        #[arg(short, long)]
        yes: bool,
        /// Keep the fan-made remix section of the listing.
        #[arg(long)]
        include_remixes: bool,
    },

    /// Convert downloaded BRSTM files with vgmstream-cli and ffmpeg.
    Convert {
        /// Target format: alac (default), flac or wav.
        #[arg(long)]
        format: Option<ConvertFormat>,
        /// Parallel workers (default: one per CPU core).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Directory of BRSTM files.
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Directory for converted files.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Compare downloaded files against the live listing.
    Verify {
        /// Exact number of songs expected (default: whatever the listing has).
        #[arg(long, value_name = "N")]
        expected: Option<usize>,
        /// Keep the fan-made remix section of the listing.
        #[arg(long)]
        include_remixes: bool,
    },

    /// Download and unpack vgmstream-cli.
    Tools,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let work_dir = std::env::current_dir()?;

        match cli.command {
            CliCommand::Urls { exclude_remixes } => {
                run_urls(&cfg, &work_dir, !exclude_remixes).await?
            }
            CliCommand::Download {
                workers,
                yes,
                include_remixes,
            } => {
                if let Some(n) = workers {
                    cfg.download.workers = n;
                }
                run_download(&cfg, &work_dir, yes, include_remixes).await?
            }
            CliCommand::Convert {
                format,
                jobs,
                input_dir,
                output_dir,
            } => {
                if let Some(f) = format {
                    cfg.convert.format = f;
                }
                if jobs.is_some() {
                    cfg.convert.workers = jobs;
                }
                if let Some(d) = input_dir {
                    cfg.paths.brstm_dir = d;
                }
                if let Some(d) = output_dir {
                    cfg.paths.output_dir = d;
                }
                run_convert(&cfg).await?
            }
            CliCommand::Verify {
                expected,
                include_remixes,
            } => {
                if expected.is_some() {
                    cfg.verify.expected_count = expected;
                }
                run_verify(&cfg, include_remixes).await?
            }
            CliCommand::Tools => run_tools(&cfg, &work_dir).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
