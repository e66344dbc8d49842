//! Soundtrack listing scrape.
//!
//! Fetches the game page once and turns its song table into `Song` records.

mod parse;

use anyhow::Result;

use crate::config::SiteConfig;
use crate::http::HttpSession;

pub use parse::parse_song_list;

/// One entry of the game's listing. Lives only for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: String,
    pub name: String,
    /// Song page; visited before the raw file and sent as its referrer.
    pub page_url: String,
    /// Raw BRSTM file.
    pub download_url: String,
}

/// Which part of the listing to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingScope {
    /// Only the official soundtrack; the fan-made section is dropped.
    #[default]
    Official,
    /// Every row on the page, remixes included.
    All,
}

impl ListingScope {
    pub fn from_include_remixes(include_remixes: bool) -> Self {
        if include_remixes {
            ListingScope::All
        } else {
            ListingScope::Official
        }
    }
}

/// Apply `scope` to a fetched page and parse it.
pub fn songs_from_page(html: &str, site: &SiteConfig, scope: ListingScope) -> Vec<Song> {
    let section = match scope {
        ListingScope::Official => parse::strip_after(html, &site.remix_marker),
        ListingScope::All => html,
    };
    parse_song_list(section, site)
}

/// Fetch the game page with `session` and return its songs.
pub fn fetch_songs_with(
    session: &mut HttpSession,
    site: &SiteConfig,
    scope: ListingScope,
) -> Result<Vec<Song>> {
    let url = site.game_url();
    tracing::info!(%url, ?scope, "fetching song list");
    let html = session.get_text(&url, None)?;
    let songs = songs_from_page(&html, site, scope);
    tracing::info!(count = songs.len(), "parsed song list");
    Ok(songs)
}

/// Fetch the game page with a fresh session and return its songs.
pub fn fetch_songs(site: &SiteConfig, scope: ListingScope) -> Result<Vec<Song>> {
    let mut session = HttpSession::new(&site.user_agent, site.timeout())?;
    fetch_songs_with(&mut session, site, scope)
}
