//! Extract song rows from the game page HTML.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Song;
use crate::config::SiteConfig;

/// One table row per song: `<tr id="s{id}"><td ...><a href="/song/{id}">{name}</a>`.
static SONG_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<tr id="s(\d+)">\s*<td[^>]*><a href="/song/\d+">([^<]+)</a>"#)
        .expect("song row pattern is valid")
});

/// Cut `html` at the first `marker`, keeping what precedes it.
/// The whole page is returned when the marker is absent.
pub(crate) fn strip_after<'a>(html: &'a str, marker: &str) -> &'a str {
    match html.find(marker) {
        Some(pos) if !marker.is_empty() => &html[..pos],
        _ => html,
    }
}

/// Decode the two entities the site emits in titles, then percent-escapes.
/// Malformed escapes stay as written; bytes that are not UTF-8 become U+FFFD.
pub(crate) fn decode_name(raw: &str) -> String {
    let unescaped = raw.replace("&#039;", "'").replace("&amp;", "&");
    let bytes = urlencoding::decode_binary(unescaped.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// All songs listed in `html`, in page order.
pub fn parse_song_list(html: &str, site: &SiteConfig) -> Vec<Song> {
    SONG_ROW
        .captures_iter(html)
        .map(|caps| {
            let id = caps[1].to_string();
            Song {
                name: decode_name(&caps[2]),
                page_url: site.song_page_url(&id),
                download_url: site.song_file_url(&id),
                id,
            }
        })
        .collect()
}
