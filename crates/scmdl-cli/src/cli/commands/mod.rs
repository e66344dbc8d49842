//! CLI command handlers, one file per subcommand.

mod convert;
mod download;
mod tools;
mod urls;
mod verify;

pub use convert::run_convert;
pub use download::run_download;
pub use tools::run_tools;
pub use urls::run_urls;
pub use verify::run_verify;

use anyhow::{Context, Result};
use scmdl_core::catalog::{self, ListingScope, Song};
use scmdl_core::config::SiteConfig;

/// Fetch the listing off the async runtime; an empty listing is an error.
async fn fetch_listing(site: &SiteConfig, include_remixes: bool) -> Result<Vec<Song>> {
    let scope = ListingScope::from_include_remixes(include_remixes);
    let songs = tokio::task::spawn_blocking({
        let site = site.clone();
        move || catalog::fetch_songs(&site, scope)
    })
    .await
    .context("listing task join")??;
    if songs.is_empty() {
        anyhow::bail!("no songs found on {}", site.game_url());
    }
    Ok(songs)
}

fn scope_note(include_remixes: bool) -> &'static str {
    if include_remixes {
        "including fan remixes"
    } else {
        "excluding fan remixes"
    }
}

/// `1536` -> `1.5 KB`, binary units.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

const RULE: &str = "==================================================";
