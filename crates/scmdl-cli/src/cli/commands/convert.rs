//! `scmdl convert` – BRSTM to ALAC/FLAC/WAV.

use anyhow::{Context, Result};
use scmdl_core::config::ScmConfig;
use scmdl_core::convert::{self, ConvertOutcome, ConvertReport, ToolPaths};

fn print_report(r: &ConvertReport) {
    match &r.outcome {
        ConvertOutcome::Converted => println!("[{}/{}] OK    Converted: {}", r.index, r.total, r.name),
        ConvertOutcome::Skipped => {
            println!("[{}/{}] SKIP  Skipped (exists): {}", r.index, r.total, r.name)
        }
        ConvertOutcome::Failed(e) => {
            println!("[{}/{}] FAIL  Failed: {} - {}", r.index, r.total, r.name, e)
        }
    }
}

pub async fn run_convert(cfg: &ScmConfig) -> Result<()> {
    let format = cfg.convert.format;
    let input = &cfg.paths.brstm_dir;
    let output = &cfg.paths.output_dir;
    let tools = ToolPaths::from_config(cfg);

    convert::check_dependencies(&tools, input, format).await?;
    std::fs::create_dir_all(output).with_context(|| format!("create {}", output.display()))?;

    let plan = convert::plan_conversion(input, output, format)?;
    if plan.total == 0 {
        println!("No BRSTM files found in {}", input.display());
        return Ok(());
    }

    let workers = cfg.convert.effective_workers();
    println!("Converting BRSTM files to {}...", format.label());
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());
    println!("Using {} parallel workers\n", workers);

    let summary = convert::convert_all(plan, &tools, format, workers, print_report).await;

    if summary.attempted() == 0 {
        println!("\nAll files already converted!");
        return Ok(());
    }
    println!("\nConversion complete!");
    println!(
        "Converted {} files in {:.1} seconds",
        summary.converted,
        summary.elapsed.as_secs_f64()
    );
    if summary.failed > 0 {
        println!("Failed: {} (re-run to retry)", summary.failed);
    }
    println!("{} files saved to: {}", format.label(), output.display());
    Ok(())
}
