//! Run the external tools for each planned file.

use std::future::Future;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::task::JoinSet;

use super::{
    ConvertFormat, ConvertOutcome, ConvertPlan, ConvertReport, ConvertSummary, ConvertTask,
    ToolPaths,
};
use crate::error::ItemError;
use crate::storage;

async fn run_tool(tool: &'static str, cmd: &mut Command) -> Result<(), ItemError> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| ItemError::Spawn { tool, source })?;
    if !status.success() {
        return Err(ItemError::ToolFailed { tool, status });
    }
    Ok(())
}

/// Convert one file. The intermediate WAV is removed in every case; a failed
/// conversion also removes any partial output.
pub async fn convert_file(
    tools: &ToolPaths,
    task: &ConvertTask,
    format: ConvertFormat,
) -> Result<(), ItemError> {
    let wav = match format.codec() {
        Some(_) => task.output.with_extension("wav"),
        None => task.output.clone(),
    };

    let result = async {
        run_tool(
            "vgmstream-cli",
            Command::new(&tools.vgmstream)
                .arg("-o")
                .arg(&wav)
                .arg(&task.input),
        )
        .await?;
        if let Some(codec) = format.codec() {
            run_tool(
                "ffmpeg",
                Command::new(&tools.ffmpeg)
                    .arg("-i")
                    .arg(&wav)
                    .args(["-c:a", codec, "-y"])
                    .arg(&task.output),
            )
            .await?;
        }
        Ok::<(), ItemError>(())
    }
    .await;

    if format.codec().is_some() {
        storage::remove_if_exists(&wav);
    }
    if result.is_err() {
        storage::remove_if_exists(&task.output);
    }
    result
}

/// Run `work` on its own task so a panic becomes this file's failure.
async fn isolate<F>(work: F) -> Result<(), ItemError>
where
    F: Future<Output = Result<(), ItemError>> + Send + 'static,
{
    tokio::spawn(work).await.unwrap_or_else(|e| Err(e.into()))
}

/// Convert every pending file in `plan` with at most `workers` in flight.
/// Skipped files are reported first, then conversions in completion order.
pub async fn convert_all<F>(
    plan: ConvertPlan,
    tools: &ToolPaths,
    format: ConvertFormat,
    workers: usize,
    mut on_report: F,
) -> ConvertSummary
where
    F: FnMut(&ConvertReport),
{
    let workers = workers.max(1);
    let total = plan.total;
    let mut summary = ConvertSummary {
        total,
        ..ConvertSummary::default()
    };

    for task in plan.skipped {
        let report = ConvertReport {
            index: task.index,
            total,
            name: task.name(),
            outcome: ConvertOutcome::Skipped,
        };
        summary.record(&report.outcome);
        on_report(&report);
    }

    let started = Instant::now();
    let mut pending = plan.pending.into_iter();
    let mut join_set = JoinSet::new();
    tracing::info!(files = pending.len(), workers, %format, "starting conversion");

    loop {
        while join_set.len() < workers {
            let Some(task) = pending.next() else { break };
            let tools = tools.clone();
            let job = task.clone();
            join_set.spawn(async move {
                let result =
                    isolate(async move { convert_file(&tools, &job, format).await }).await;
                (task, result)
            });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        let (task, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!("conversion task join: {}", e);
                summary.failed += 1;
                continue;
            }
        };
        let outcome = match result {
            Ok(()) => {
                tracing::info!(input = %task.input.display(), output = %task.output.display(), "converted");
                ConvertOutcome::Converted
            }
            Err(e) => {
                tracing::warn!(input = %task.input.display(), "conversion failed: {}", e);
                ConvertOutcome::Failed(e)
            }
        };
        let report = ConvertReport {
            index: task.index,
            total,
            name: task.name(),
            outcome,
        };
        summary.record(&report.outcome);
        on_report(&report);
    }

    summary.elapsed = started.elapsed();
    summary
}
