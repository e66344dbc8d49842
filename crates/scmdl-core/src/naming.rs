//! Local filenames for songs.

/// Characters that are invalid on at least one common filesystem.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Extension of downloaded raw files.
pub const BRSTM_EXT: &str = "brstm";

/// Replaces each filesystem-hostile character with `_` and trims surrounding whitespace.
///
/// Distinct names may collide after sanitizing (`a/b` and `a:b`); callers
/// treat the sanitized name as the identity of the file.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim().to_string()
}

/// `sanitize(name).ext`
pub fn song_filename(name: &str, ext: &str) -> String {
    format!("{}.{}", sanitize_filename(name), ext)
}
