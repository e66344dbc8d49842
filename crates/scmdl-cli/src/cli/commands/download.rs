//! `scmdl download` – fetch every BRSTM of the listing.

use anyhow::{Context, Result};
use scmdl_core::config::ScmConfig;
use scmdl_core::convert::resolve_tool;
use scmdl_core::download::{self, DownloadOutcome, DownloadReport, DownloadSettings};
use scmdl_core::scripts;
use std::io::{self, BufRead, Write};
use std::path::Path;

use super::{fetch_listing, human_size, scope_note, RULE};

fn print_report(r: &DownloadReport) {
    match &r.outcome {
        DownloadOutcome::Downloaded { .. } => {
            println!("[{}/{}] OK    Downloaded: {}", r.completed, r.total, r.name)
        }
        DownloadOutcome::Skipped => println!(
            "[{}/{}] SKIP  Skipped (already exists): {}",
            r.completed, r.total, r.name
        ),
        DownloadOutcome::Failed(e) => {
            println!("[{}/{}] FAIL  Failed: {} - {}", r.completed, r.total, r.name, e)
        }
    }
}

/// Ask on stdin; anything but `y` declines.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} (y/n): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

pub async fn run_download(
    cfg: &ScmConfig,
    work_dir: &Path,
    yes: bool,
    include_remixes: bool,
) -> Result<()> {
    println!("Soundtrack Downloader");
    println!("{RULE}");
    println!("\nFetching song list from {}...", cfg.site.game_url());

    let songs = fetch_listing(&cfg.site, include_remixes).await?;
    println!("Found {} songs ({})", songs.len(), scope_note(include_remixes));

    let settings = DownloadSettings::from_config(cfg);
    if !yes
        && !confirm(&format!(
            "\nReady to download {} BRSTM files into {}. Continue?",
            songs.len(),
            settings.dir.display()
        ))?
    {
        println!("Download cancelled.");
        return Ok(());
    }

    println!(
        "\nDownloading {} BRSTM files to {}",
        songs.len(),
        settings.dir.display()
    );
    println!("Using {} concurrent download(s)", settings.workers.max(1));
    println!(
        "Downloads pause {:.1}-{:.1}s per song to avoid triggering bot protection\n",
        settings.pacing.min.as_secs_f64(),
        settings.pacing.max.as_secs_f64()
    );

    let summary = tokio::task::spawn_blocking({
        let settings = settings.clone();
        move || download::download_all(songs, &settings, print_report)
    })
    .await
    .context("download task join")??;

    println!("\n{RULE}");
    println!("Download complete!");
    println!("Total songs: {}", summary.total);
    println!(
        "Downloaded: {} ({})",
        summary.downloaded,
        human_size(summary.bytes)
    );
    println!("Skipped: {}", summary.skipped);
    println!("Failed: {}", summary.failed);
    println!("Output directory: {}", settings.dir.display());

    match resolve_tool(&cfg.paths.vgmstream) {
        Some(vgm) => {
            let vgm = std::fs::canonicalize(&vgm).unwrap_or(vgm);
            let script = scripts::write_convert_script(
                work_dir,
                &vgm,
                &cfg.paths.brstm_dir,
                Path::new(scripts::CONVERT_SCRIPT_OUTPUT_DIR),
            )?;
            println!("\nCreated conversion script: {}", script.display());
            println!("\nNext steps:");
            println!("1. BRSTM files are in: {}/", settings.dir.display());
            println!("2. Convert with `scmdl convert`, or run ./{}", scripts::CONVERT_SCRIPT_FILE);
        }
        None => {
            println!("\nNext steps:");
            println!("1. BRSTM files are in: {}/", settings.dir.display());
            println!("2. Fetch the extractor with `scmdl tools`, then run `scmdl convert`");
        }
    }

    if summary.failed > 0 {
        println!("\nSome downloads failed. Re-run to retry only the missing files.");
        println!("If failures mention bot protection, try a different network or a later time,");
        println!("or download manually from {}", cfg.site.game_url());
    }
    Ok(())
}
