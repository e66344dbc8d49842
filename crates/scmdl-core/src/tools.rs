//! Fetch and unpack `vgmstream-cli`.
//!
//! Tries the automated-build archive first; when that URL does not answer 200
//! the latest GitHub release is queried for an asset matching the platform.
//! `.tar.gz` and `.zip` archives are unpacked in-process.

use anyhow::{Context, Result};
use serde::Deserialize;
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;
use crate::http::HttpSession;
use crate::storage;

/// Name of the extracted binary inside the install dir.
pub const VGMSTREAM_BIN: &str = "vgmstream-cli";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Archive chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if lower.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// First asset whose lowercase name mentions both `platform` and `cli`.
pub fn pick_asset(release: &Release, platform: &str) -> Option<Asset> {
    let platform = platform.to_ascii_lowercase();
    release
        .assets
        .iter()
        .find(|a| {
            let n = a.name.to_ascii_lowercase();
            n.contains(&platform) && n.contains("cli")
        })
        .map(|a| Asset {
            url: a.browser_download_url.clone(),
            file_name: a.name.clone(),
        })
}

/// Last path segment of `url`, used as the archive file name.
fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Decide which archive to fetch.
pub fn resolve_vgmstream_asset(session: &mut HttpSession, cfg: &ToolsConfig) -> Result<Asset> {
    let status = session.head(&cfg.archive_url).unwrap_or_else(|e| {
        tracing::debug!("archive probe failed: {}", e);
        0
    });
    if status == 200 {
        let file_name = file_name_from_url(&cfg.archive_url)
            .context("archive URL has no file name")?;
        return Ok(Asset {
            url: cfg.archive_url.clone(),
            file_name,
        });
    }

    tracing::info!(status, "automated build unavailable, checking GitHub releases");
    let body = session.get_text(&cfg.releases_api_url, None)?;
    let release: Release =
        serde_json::from_str(&body).context("parse GitHub release response")?;
    tracing::debug!(tag = ?release.tag_name, assets = release.assets.len(), "latest release");
    pick_asset(&release, &cfg.platform).with_context(|| {
        format!("no '{}' CLI build in the latest vgmstream release", cfg.platform)
    })
}

fn extract(kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    match kind {
        ArchiveKind::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(dest)
            .with_context(|| format!("extract {}", archive.display())),
        ArchiveKind::Zip => zip::ZipArchive::new(file)
            .and_then(|mut zip| zip.extract(dest))
            .with_context(|| format!("extract {}", archive.display())),
    }
}

/// Unpack `archive` into `dest` and return the absolute path of the binary.
/// The archive is removed afterwards.
pub fn unpack_vgmstream(archive: &Path, dest: &Path) -> Result<PathBuf> {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = ArchiveKind::from_file_name(&file_name)
        .with_context(|| format!("unknown archive format: {}", file_name))?;

    std::fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    let extracted = extract(kind, archive, dest);
    storage::remove_if_exists(archive);
    extracted?;

    let bin = dest.join(VGMSTREAM_BIN);
    if !bin.is_file() {
        anyhow::bail!("{} not found in extracted files", VGMSTREAM_BIN);
    }
    storage::make_executable(&bin).with_context(|| format!("chmod {}", bin.display()))?;
    let abs = std::fs::canonicalize(&bin).with_context(|| format!("resolve {}", bin.display()))?;
    tracing::info!(path = %abs.display(), "vgmstream-cli installed");
    Ok(abs)
}

/// Download the extractor archive into `work_dir` and unpack it into `cfg.install_dir`.
pub fn install_vgmstream(
    session: &mut HttpSession,
    cfg: &ToolsConfig,
    work_dir: &Path,
) -> Result<PathBuf> {
    let asset = resolve_vgmstream_asset(session, cfg)?;
    let archive = work_dir.join(&asset.file_name);
    tracing::info!(url = %asset.url, "downloading {}", asset.file_name);
    let bytes = session.download_to(&asset.url, &archive)?;
    tracing::debug!(bytes, "archive downloaded");
    let dest = if cfg.install_dir.is_absolute() {
        cfg.install_dir.clone()
    } else {
        work_dir.join(&cfg.install_dir)
    };
    unpack_vgmstream(&archive, &dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELEASE_JSON: &str = r#"{
        "tag_name": "r1980",
        "assets": [
            {"name": "vgmstream-win64.zip", "browser_download_url": "https://dl/win64.zip"},
            {"name": "vgmstream-mac-cli.tar.gz", "browser_download_url": "https://dl/mac-cli.tar.gz"},
            {"name": "vgmstream-linux-cli.tar.gz", "browser_download_url": "https://dl/linux-cli.tar.gz"}
        ]
    }"#;

    #[test]
    fn picks_platform_cli_asset() {
        let release: Release = serde_json::from_str(RELEASE_JSON).unwrap();
        assert_eq!(release.tag_name.as_deref(), Some("r1980"));
        let mac = pick_asset(&release, "mac").unwrap();
        assert_eq!(mac.file_name, "vgmstream-mac-cli.tar.gz");
        assert_eq!(mac.url, "https://dl/mac-cli.tar.gz");
        let linux = pick_asset(&release, "Linux").unwrap();
        assert_eq!(linux.url, "https://dl/linux-cli.tar.gz");
        assert!(pick_asset(&release, "win").is_none(), "win asset lacks 'cli'");
    }

    #[test]
    fn archive_kind_from_name() {
        assert_eq!(ArchiveKind::from_file_name("a.tar.gz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::from_file_name("A.ZIP"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_file_name("a.7z"), None);
    }

    #[test]
    fn file_name_from_archive_url() {
        assert_eq!(
            file_name_from_url("https://vgmstream.org/downloads/vgmstream-mac-cli.tar.gz").as_deref(),
            Some("vgmstream-mac-cli.tar.gz")
        );
        assert_eq!(file_name_from_url("https://vgmstream.org/"), None);
    }

    #[test]
    fn unknown_archive_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("vgmstream.7z");
        std::fs::write(&archive, b"x").unwrap();
        let err = unpack_vgmstream(&archive, &dir.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("unknown archive format"));
    }

    const FAKE_BIN: &[u8] = b"#!/bin/sh\necho vgmstream\n";

    fn write_tarball(path: &Path) {
        let gz = flate2::write::GzEncoder::new(
            File::create(path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_size(FAKE_BIN.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, VGMSTREAM_BIN, FAKE_BIN).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path) {
        use std::io::Write;
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        zip.start_file(VGMSTREAM_BIN, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(FAKE_BIN).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn unpacks_tarball_and_removes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("vgmstream-linux-cli.tar.gz");
        write_tarball(&archive);

        let bin = unpack_vgmstream(&archive, &dir.path().join("vgmstream")).unwrap();
        assert!(bin.is_absolute());
        assert!(bin.ends_with("vgmstream/vgmstream-cli"));
        assert_eq!(std::fs::read(&bin).unwrap(), FAKE_BIN);
        assert!(!archive.exists(), "archive removed after extraction");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&bin).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn unpacks_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("vgmstream-win64-cli.zip");
        write_zip(&archive);

        let bin = unpack_vgmstream(&archive, &dir.path().join("vgm")).unwrap();
        assert_eq!(std::fs::read(&bin).unwrap(), FAKE_BIN);
        assert!(!archive.exists());
    }

    #[test]
    fn corrupt_archive_is_an_error_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("vgmstream-mac-cli.tar.gz");
        std::fs::write(&archive, b"not gzip at all").unwrap();
        let err = unpack_vgmstream(&archive, &dir.path().join("out")).unwrap_err();
        assert!(format!("{:#}", err).contains("extract"), "{:#}", err);
        assert!(!archive.exists());
    }
}
