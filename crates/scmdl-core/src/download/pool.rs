//! Worker pool for song downloads.
//!
//! A fixed number of OS threads pull songs from a shared queue; each thread
//! owns its own `HttpSession`. Results are reported in completion order.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use super::{download_song, DownloadOutcome, DownloadReport, DownloadSettings, DownloadSummary};
use crate::catalog::Song;
use crate::http::HttpSession;

/// Download every song into `settings.dir` (created if missing) using
/// `settings.workers` threads. `on_report` is called once per song as it finishes.
pub fn download_all<F>(
    songs: Vec<Song>,
    settings: &DownloadSettings,
    mut on_report: F,
) -> Result<DownloadSummary>
where
    F: FnMut(&DownloadReport),
{
    std::fs::create_dir_all(&settings.dir)
        .with_context(|| format!("create {}", settings.dir.display()))?;

    let total = songs.len();
    let mut summary = DownloadSummary {
        total,
        ..DownloadSummary::default()
    };
    if total == 0 {
        return Ok(summary);
    }

    let num_workers = settings.workers.max(1).min(total);
    let mut sessions = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        sessions.push(HttpSession::new(&settings.user_agent, settings.timeout)?);
    }
    tracing::info!(total, workers = num_workers, dir = %settings.dir.display(), "starting downloads");

    let work: Arc<Mutex<VecDeque<Song>>> = Arc::new(Mutex::new(songs.into_iter().collect()));
    let (tx, rx) = mpsc::channel::<(String, DownloadOutcome)>();
    let mut handles = Vec::with_capacity(num_workers);
    for mut session in sessions {
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let settings = settings.clone();
        handles.push(std::thread::spawn(move || loop {
            // A poisoned queue means another worker panicked; stop taking work.
            let next = work.lock().ok().and_then(|mut q| q.pop_front());
            let Some(song) = next else { break };
            let outcome = download_song(
                &mut session,
                &song,
                &settings.dir,
                &settings.pacing,
                &settings.game_url,
            );
            if tx.send((song.name, outcome)).is_err() {
                break;
            }
        }));
    }
    drop(tx);

    for (name, outcome) in rx {
        summary.record(&outcome);
        let report = DownloadReport {
            completed: summary.downloaded + summary.skipped + summary.failed,
            total,
            name,
            outcome,
        };
        on_report(&report);
    }

    for h in handles {
        if h.join().is_err() {
            tracing::error!("download worker panicked");
        }
    }

    tracing::info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "downloads finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::Pacing;
    use std::time::Duration;

    fn settings(dir: &std::path::Path, workers: usize) -> DownloadSettings {
        DownloadSettings {
            dir: dir.to_path_buf(),
            workers,
            pacing: Pacing::none(),
            user_agent: "test".into(),
            timeout: Duration::from_secs(1),
            game_url: "http://127.0.0.1:9/game/1".into(),
        }
    }

    #[test]
    fn empty_list_creates_dir_and_reports_nothing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("brstm");
        let mut calls = 0;
        let summary = download_all(Vec::new(), &settings(&dir, 1), |_| calls += 1).unwrap();
        assert!(dir.is_dir());
        assert_eq!(calls, 0);
        assert_eq!(summary, DownloadSummary::default());
    }

    #[test]
    fn already_present_songs_are_all_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let songs: Vec<Song> = (1..=4)
            .map(|i| {
                let name = format!("Track {i}");
                std::fs::write(dir.path().join(format!("{name}.brstm")), b"x").unwrap();
                Song {
                    id: i.to_string(),
                    name,
                    page_url: format!("http://127.0.0.1:9/song/{i}"),
                    download_url: format!("http://127.0.0.1:9/brstm/{i}"),
                }
            })
            .collect();
        let mut seen = Vec::new();
        let summary = download_all(songs, &settings(dir.path(), 3), |r| {
            seen.push((r.completed, r.total))
        })
        .unwrap();
        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.last(), Some(&(4, 4)));
    }
}
