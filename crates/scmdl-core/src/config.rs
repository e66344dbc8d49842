use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::convert::ConvertFormat;

/// Where the soundtrack listing lives and how we present ourselves to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root without trailing slash, e.g. `https://smashcustommusic.net`.
    pub base_url: String,
    /// Numeric game id whose listing is scraped (`{base_url}/game/{game_id}`).
    pub game_id: u32,
    /// Browser user agent sent with every request.
    pub user_agent: String,
    /// Heading that starts the fan-made section; everything after it is dropped
    /// unless remixes are requested.
    pub remix_marker: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://smashcustommusic.net".to_string(),
            game_id: 5609,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36"
                .to_string(),
            remix_marker: "Remixes / Fanmade".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SiteConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn game_url(&self) -> String {
        format!("{}/game/{}", self.base(), self.game_id)
    }

    pub fn song_page_url(&self, id: &str) -> String {
        format!("{}/song/{}", self.base(), id)
    }

    pub fn song_file_url(&self, id: &str) -> String {
        format!("{}/brstm/{}", self.base(), id)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Directories and external tool locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Downloaded BRSTM files.
    pub brstm_dir: PathBuf,
    /// Converted audio files.
    pub output_dir: PathBuf,
    /// `vgmstream-cli` binary. A bare name is looked up on PATH.
    pub vgmstream: PathBuf,
    /// `ffmpeg` binary. A bare name is looked up on PATH.
    pub ffmpeg: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            brstm_dir: PathBuf::from("mkw_music_brstm"),
            output_dir: PathBuf::from("mkw_music_alac"),
            vgmstream: PathBuf::from("vgmstream/vgmstream-cli"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Concurrent downloads. Keep at 1 unless the site tolerates more.
    pub workers: usize,
    /// Lower bound of the random pause between song page and file fetch.
    pub delay_min_secs: f64,
    /// Upper bound of the random pause.
    pub delay_max_secs: f64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            delay_min_secs: 1.0,
            delay_max_secs: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Worker count; `None` = one per available CPU core.
    pub workers: Option<usize>,
    pub format: ConvertFormat,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            workers: None,
            format: ConvertFormat::Alac,
        }
    }
}

impl ConvertConfig {
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Exact number of songs the listing should have; `None` trusts the live listing.
    pub expected_count: Option<usize>,
    /// Files smaller than this are reported as likely failed downloads.
    pub small_file_bytes: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            expected_count: None,
            small_file_bytes: 100_000,
        }
    }
}

/// Where `scmdl tools` fetches the extractor from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Automated-build archive tried first.
    pub archive_url: String,
    /// GitHub "latest release" endpoint used when the archive is unavailable.
    pub releases_api_url: String,
    /// Asset name keyword for this platform (`mac`, `linux`, `win`).
    pub platform: String,
    /// Directory the archive is extracted into.
    pub install_dir: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let platform = default_platform_keyword();
        Self {
            archive_url: format!("https://vgmstream.org/downloads/vgmstream-{platform}-cli.tar.gz"),
            releases_api_url: "https://api.github.com/repos/vgmstream/vgmstream/releases/latest"
                .to_string(),
            platform: platform.to_string(),
            install_dir: PathBuf::from("vgmstream"),
        }
    }
}

fn default_platform_keyword() -> &'static str {
    match std::env::consts::OS {
        "macos" => "mac",
        "windows" => "win",
        _ => "linux",
    }
}

/// Global configuration loaded from `~/.config/scmdl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScmConfig {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    pub download: DownloadConfig,
    pub convert: ConvertConfig,
    pub verify: VerifyConfig,
    pub tools: ToolsConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("scmdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ScmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ScmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<ScmConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: ScmConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
