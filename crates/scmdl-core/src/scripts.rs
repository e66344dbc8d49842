//! URL lists and shell helpers for downloading or converting without scmdl.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Song;
use crate::naming::{song_filename, BRSTM_EXT};
use crate::storage;

pub const URL_LIST_FILE: &str = "mkw_urls.txt";
pub const WGET_SCRIPT_FILE: &str = "download_with_wget.sh";
pub const ARIA2_INPUT_FILE: &str = "mkw_aria2_input.txt";
pub const CONVERT_SCRIPT_FILE: &str = "convert_to_flac.sh";
/// Output directory baked into the generated FLAC script.
pub const CONVERT_SCRIPT_OUTPUT_DIR: &str = "mkw_music_flac";

/// Seconds the wget script sleeps between files.
const WGET_DELAY_SECS: u32 = 2;

/// Escape for use inside a double-quoted bash string.
fn dq(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Single-line text for a `#` comment.
fn comment(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

pub fn render_url_list(songs: &[Song]) -> String {
    songs.iter().fold(String::new(), |mut out, s| {
        let _ = writeln!(out, "{}", s.download_url);
        out
    })
}

pub fn render_wget_script(songs: &[Song], user_agent: &str, target_dir: &Path) -> String {
    let dir = dq(&target_dir.display().to_string());
    let mut out = String::new();
    out.push_str("#!/bin/bash\n\n");
    out.push_str("# Soundtrack download script using wget\n");
    out.push_str("# Downloads files one by one with delays\n\n");
    let _ = writeln!(out, "mkdir -p \"{dir}\"");
    let _ = writeln!(out, "cd \"{dir}\"\n");
    for song in songs {
        let filename = song_filename(&song.name, BRSTM_EXT);
        let _ = writeln!(out, "# {}", comment(&song.name));
        let _ = writeln!(out, "echo \"Downloading: {}\"", dq(&song.name));
        let _ = writeln!(
            out,
            "wget -O \"{}\" --referer=\"{}\" --user-agent=\"{}\" \"{}\"",
            dq(&filename),
            dq(&song.page_url),
            dq(user_agent),
            dq(&song.download_url)
        );
        let _ = writeln!(out, "sleep {WGET_DELAY_SECS}\n");
    }
    out
}

pub fn render_aria2_input(songs: &[Song]) -> String {
    let mut out = String::new();
    for song in songs {
        let _ = writeln!(out, "{}", song.download_url);
        let _ = writeln!(out, "  out={}", song_filename(&song.name, BRSTM_EXT));
        let _ = writeln!(out, "  referer={}", song.page_url);
    }
    out
}

pub fn render_convert_script(vgmstream: &Path, input_dir: &Path, output_dir: &Path) -> String {
    format!(
        r#"#!/bin/bash

VGMSTREAM="{vgmstream}"
INPUT_DIR="{input}"
OUTPUT_DIR="{output}"

if [ ! -f "$VGMSTREAM" ]; then
    echo "Error: vgmstream-cli not found at $VGMSTREAM"
    exit 1
fi

if [ ! -d "$INPUT_DIR" ]; then
    echo "Error: Input directory $INPUT_DIR not found"
    exit 1
fi

mkdir -p "$OUTPUT_DIR"

echo "Converting BRSTM files to FLAC..."
echo "Input: $INPUT_DIR"
echo "Output: $OUTPUT_DIR"
echo ""

count=0
total=$(find "$INPUT_DIR" -name "*.brstm" | wc -l | tr -d ' ')

for brstm in "$INPUT_DIR"/*.brstm; do
    if [ -f "$brstm" ]; then
        basename=$(basename "$brstm" .brstm)
        output="$OUTPUT_DIR/$basename.flac"
        count=$((count + 1))

        if [ ! -f "$output" ]; then
            echo "[$count/$total] Converting: $basename"
            if "$VGMSTREAM" -o "$output" "$brstm" 2>/dev/null; then
                echo "[$count/$total] Converted: $basename"
            else
                echo "[$count/$total] Failed: $basename"
            fi
        else
            echo "[$count/$total] Skipped (exists): $basename"
        fi
    fi
done

echo ""
echo "Conversion complete!"
echo "FLAC files saved to: $OUTPUT_DIR"
"#,
        vgmstream = dq(&vgmstream.display().to_string()),
        input = dq(&input_dir.display().to_string()),
        output = dq(&output_dir.display().to_string()),
    )
}

fn write_file(path: &Path, contents: &str, executable: bool) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    if executable {
        storage::make_executable(path).with_context(|| format!("chmod {}", path.display()))?;
    }
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote helper file");
    Ok(())
}

/// Paths of the files written by `write_download_helpers`.
#[derive(Debug, Clone)]
pub struct DownloadHelpers {
    pub url_list: PathBuf,
    pub wget_script: PathBuf,
    pub aria2_input: PathBuf,
}

/// Write the URL list, wget script and aria2c input into `out_dir`.
pub fn write_download_helpers(
    out_dir: &Path,
    songs: &[Song],
    user_agent: &str,
    target_dir: &Path,
) -> Result<DownloadHelpers> {
    let helpers = DownloadHelpers {
        url_list: out_dir.join(URL_LIST_FILE),
        wget_script: out_dir.join(WGET_SCRIPT_FILE),
        aria2_input: out_dir.join(ARIA2_INPUT_FILE),
    };
    write_file(&helpers.url_list, &render_url_list(songs), false)?;
    write_file(
        &helpers.wget_script,
        &render_wget_script(songs, user_agent, target_dir),
        true,
    )?;
    write_file(&helpers.aria2_input, &render_aria2_input(songs), false)?;
    Ok(helpers)
}

/// Write the FLAC conversion helper into `out_dir` and return its path.
pub fn write_convert_script(
    out_dir: &Path,
    vgmstream: &Path,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = out_dir.join(CONVERT_SCRIPT_FILE);
    write_file(
        &path,
        &render_convert_script(vgmstream, input_dir, output_dir),
        true,
    )?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn songs() -> Vec<Song> {
        vec![
            Song {
                id: "1".into(),
                name: "Title Screen".into(),
                page_url: "https://x.test/song/1".into(),
                download_url: "https://x.test/brstm/1".into(),
            },
            Song {
                id: "2".into(),
                name: "Boss \"Final\": $phase".into(),
                page_url: "https://x.test/song/2".into(),
                download_url: "https://x.test/brstm/2".into(),
            },
        ]
    }

    #[test]
    fn url_list_one_per_line() {
        assert_eq!(
            render_url_list(&songs()),
            "https://x.test/brstm/1\nhttps://x.test/brstm/2\n"
        );
    }

    #[test]
    fn wget_script_has_referer_agent_and_delay() {
        let s = render_wget_script(&songs(), "UA/1.0", Path::new("mkw_music_brstm"));
        assert!(s.starts_with("#!/bin/bash\n"));
        assert!(s.contains("mkdir -p \"mkw_music_brstm\"\ncd \"mkw_music_brstm\"\n"));
        assert!(s.contains(
            "wget -O \"Title Screen.brstm\" --referer=\"https://x.test/song/1\" \
             --user-agent=\"UA/1.0\" \"https://x.test/brstm/1\"\nsleep 2\n"
        ));
        assert_eq!(s.matches("sleep 2").count(), 2);
    }

    #[test]
    fn wget_script_escapes_shell_metacharacters() {
        let s = render_wget_script(&songs(), "UA", Path::new("d"));
        assert!(s.contains(r#"echo "Downloading: Boss \"Final\": \$phase""#));
        assert!(s.contains(r#"-O "Boss _Final__ \$phase.brstm""#));
    }

    #[test]
    fn aria2_input_block_per_song() {
        let s = render_aria2_input(&songs()[..1]);
        assert_eq!(
            s,
            "https://x.test/brstm/1\n  out=Title Screen.brstm\n  referer=https://x.test/song/1\n"
        );
    }

    #[test]
    fn convert_script_embeds_paths() {
        let s = render_convert_script(
            Path::new("/opt/vgm/vgmstream-cli"),
            Path::new("in"),
            Path::new("out"),
        );
        assert!(s.contains("VGMSTREAM=\"/opt/vgm/vgmstream-cli\"\n"));
        assert!(s.contains("INPUT_DIR=\"in\"\nOUTPUT_DIR=\"out\"\n"));
        assert!(s.contains("output=\"$OUTPUT_DIR/$basename.flac\""));
    }

    #[test]
    fn helpers_are_written_and_script_is_executable() {
        let dir = tempfile::tempdir().unwrap();
        let h = write_download_helpers(dir.path(), &songs(), "UA", Path::new("brstm")).unwrap();
        assert!(h.url_list.exists());
        assert!(h.aria2_input.exists());
        let script = fs::read_to_string(&h.wget_script).unwrap();
        assert!(script.contains("Title Screen.brstm"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&h.wget_script).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }
}
