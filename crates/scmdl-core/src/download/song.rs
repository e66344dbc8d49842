//! Download of a single song.

use std::path::Path;

use super::{DownloadOutcome, Pacing};
use crate::catalog::Song;
use crate::error::ItemError;
use crate::http::HttpSession;
use crate::naming::{song_filename, BRSTM_EXT};
use crate::storage;

/// Bytes of an HTML response inspected for the bot-check wording.
const SNIFF_BYTES: usize = 500;
/// Real BRSTM files are far larger; anything below this is suspect.
const MIN_AUDIO_BYTES: usize = 1000;
const BOT_MARKERS: &[&str] = &["unusual activity", "robot"];

/// True when an HTML response carries the site's bot-check page.
pub fn is_bot_challenge(content_type: Option<&str>, body: &[u8]) -> bool {
    let is_html = content_type.is_some_and(|ct| ct.contains("text/html"));
    if !is_html {
        return false;
    }
    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_BYTES)]);
    BOT_MARKERS.iter().any(|m| head.contains(m))
}

/// True when a tiny body looks like an HTML error page rather than audio.
pub fn is_error_page(body: &[u8]) -> bool {
    body.len() < MIN_AUDIO_BYTES && String::from_utf8_lossy(body).to_lowercase().contains("html")
}

/// Download `song` into `dir` unless its file already exists.
pub fn download_song(
    session: &mut HttpSession,
    song: &Song,
    dir: &Path,
    pacing: &Pacing,
    game_url: &str,
) -> DownloadOutcome {
    let dest = dir.join(song_filename(&song.name, BRSTM_EXT));
    if dest.exists() {
        tracing::debug!(song = %song.name, "already present");
        return DownloadOutcome::Skipped;
    }
    match fetch_into(session, song, &dest, pacing, game_url) {
        Ok(bytes) => {
            tracing::info!(song = %song.name, bytes, "downloaded");
            DownloadOutcome::Downloaded { bytes }
        }
        Err(e) => {
            tracing::warn!(song = %song.name, url = %song.download_url, "download failed: {}", e);
            DownloadOutcome::Failed(e)
        }
    }
}

fn fetch_into(
    session: &mut HttpSession,
    song: &Song,
    dest: &Path,
    pacing: &Pacing,
    game_url: &str,
) -> Result<u64, ItemError> {
    // The site only serves the file to clients that came through the song page.
    let page = session.get(&song.page_url, Some(game_url))?;
    if !page.is_success() {
        return Err(ItemError::Http(page.status));
    }

    std::thread::sleep(pacing.sample(&mut rand::thread_rng()));

    let resp = session.get(&song.download_url, Some(&song.page_url))?;
    if !resp.is_success() {
        return Err(ItemError::Http(resp.status));
    }
    if is_bot_challenge(resp.content_type.as_deref(), &resp.body) {
        return Err(ItemError::BotProtection);
    }
    if is_error_page(&resp.body) {
        return Err(ItemError::ErrorPage);
    }

    storage::write_atomic(dest, &resp.body)?;
    Ok(resp.body.len() as u64)
}
