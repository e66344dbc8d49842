//! Paced, referrer-aware BRSTM downloads.
//!
//! Each song is fetched the way a browser would reach it: game page, then
//! song page, then the raw file, with a random pause in between. Failures are
//! per song; the run always continues with the next one.

mod pool;
mod song;

use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ScmConfig;
use crate::error::ItemError;

pub use pool::download_all;
pub use song::{download_song, is_bot_challenge, is_error_page};

/// Upper limit for either pacing bound.
pub const MAX_PAUSE: Duration = Duration::from_secs(3600);

/// Random pause between visiting the song page and fetching the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    /// Negative and NaN bounds become zero, huge or infinite ones
    /// `MAX_PAUSE`; swapped bounds are reordered.
    pub fn from_secs(min: f64, max: f64) -> Self {
        let a = pause_from_secs(min);
        let b = pause_from_secs(max);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

fn pause_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).map_or(MAX_PAUSE, |d| d.min(MAX_PAUSE))
}

/// Everything a download run needs besides the song list.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub dir: PathBuf,
    pub workers: usize,
    pub pacing: Pacing,
    pub user_agent: String,
    pub timeout: Duration,
    /// Sent as referrer when visiting a song page.
    pub game_url: String,
}

impl DownloadSettings {
    pub fn from_config(cfg: &ScmConfig) -> Self {
        Self {
            dir: cfg.paths.brstm_dir.clone(),
            workers: cfg.download.workers,
            pacing: Pacing::from_secs(cfg.download.delay_min_secs, cfg.download.delay_max_secs),
            user_agent: cfg.site.user_agent.clone(),
            timeout: cfg.site.timeout(),
            game_url: cfg.site.game_url(),
        }
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    /// The target file was already present.
    Skipped,
    Failed(ItemError),
}

/// One finished song, in completion order.
#[derive(Debug)]
pub struct DownloadReport {
    /// Songs finished so far, including this one.
    pub completed: usize,
    pub total: usize,
    pub name: String,
    pub outcome: DownloadOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl DownloadSummary {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }
}
