//! `scmdl urls` – write download helpers for external tools.

use anyhow::{Context, Result};
use scmdl_core::config::ScmConfig;
use scmdl_core::scripts;
use std::path::Path;

use super::{fetch_listing, scope_note, RULE};

pub async fn run_urls(cfg: &ScmConfig, work_dir: &Path, include_remixes: bool) -> Result<()> {
    println!("Soundtrack URL Generator");
    println!("{RULE}\n");
    println!("Fetching song list from {}...", cfg.site.game_url());

    let songs = fetch_listing(&cfg.site, include_remixes).await?;
    println!("Found {} songs ({})", songs.len(), scope_note(include_remixes));

    let helpers = scripts::write_download_helpers(
        work_dir,
        &songs,
        &cfg.site.user_agent,
        &cfg.paths.brstm_dir,
    )
    .context("write download helpers")?;
    tracing::info!(songs = songs.len(), "wrote download helpers");

    let brstm_dir = cfg.paths.brstm_dir.display();
    println!("\nGenerated download files:");
    println!("- {}: plain URL list", helpers.url_list.display());
    println!("- {}: bash script using wget with delays", helpers.wget_script.display());
    println!("- {}: input file for aria2c", helpers.aria2_input.display());

    println!("\nHow to use:");
    println!("\n1. With wget (recommended for bot protection):");
    println!("   ./{}", scripts::WGET_SCRIPT_FILE);
    println!("\n2. With aria2c (faster but might trigger bot protection):");
    println!(
        "   aria2c -i {} -d {} --max-concurrent-downloads=1",
        scripts::ARIA2_INPUT_FILE,
        brstm_dir
    );
    if let Some(song) = songs.first() {
        println!("\n3. With curl (manual, one file at a time):");
        println!(
            "   curl -o output.brstm --referer '{}' '{}'",
            song.page_url, song.download_url
        );
    }

    println!("\nIf you get bot protection errors, try a VPN, longer delays, or smaller batches.");
    Ok(())
}
