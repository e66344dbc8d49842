//! Per-item failure reasons.
//!
//! A failed song or file never aborts a run; the reason is reported next to
//! the item and the loop moves on.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ItemError {
    /// The site answered with its "unusual activity" / robot check page.
    #[error("Bot protection triggered")]
    BotProtection,

    /// A tiny HTML body arrived where audio data was expected.
    #[error("Got error page instead of file")]
    ErrorPage,

    #[error("HTTP {0}")]
    Http(u32),

    #[error("{0}")]
    Transfer(#[from] curl::Error),

    #[error("{0}")]
    Io(#[from] io::Error),

    /// External tool could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    /// The task handling the item panicked or was cancelled.
    #[error("worker task failed: {0}")]
    WorkerCrashed(#[from] tokio::task::JoinError),

    /// External tool ran but reported failure.
    #[error("{tool} exited with {status}")]
    ToolFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
    },
}
