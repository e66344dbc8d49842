//! `scmdl verify` – compare downloads against the listing.

use anyhow::Result;
use scmdl_core::config::ScmConfig;
use scmdl_core::verify::{self, VerifyReport};

use super::{fetch_listing, scope_note, RULE};

const MAX_LISTED_NAMES: usize = 10;
const MAX_LISTED_SMALL: usize = 5;

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = MIB * 1024.0;

fn print_names(label: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("\n{} ({}):", label, names.len());
    for n in names.iter().take(MAX_LISTED_NAMES) {
        println!("  - {n}");
    }
    if names.len() > MAX_LISTED_NAMES {
        println!("  ... and {} more", names.len() - MAX_LISTED_NAMES);
    }
}

fn print_report(r: &VerifyReport, include_remixes: bool) {
    println!("\nVerification Results:");
    println!("Expected songs: {}", r.expected);
    println!("Downloaded files: {}", r.found.len());

    if r.count_ok() {
        println!(
            "\nCOUNT VERIFICATION: PASSED - exactly {} songs downloaded ({})",
            r.target_count(),
            scope_note(include_remixes)
        );
    } else {
        println!(
            "\nCOUNT VERIFICATION: FAILED - expected {}, got {}",
            r.target_count(),
            r.found.len()
        );
    }

    print_names("Missing files", &r.missing);
    print_names("Extra files", &r.extra);
    if r.names_ok() {
        println!("\nFILE MATCHING: PASSED - all expected files present, no extras");
    }

    println!("\nFile Size Analysis:");
    println!("Total size: {:.2} GB", r.sizes.total as f64 / GIB);
    println!("Average file size: {:.2} MB", r.sizes.average / MIB);
    println!("Smallest file: {:.2} MB", r.sizes.min as f64 / MIB);
    println!("Largest file: {:.2} MB", r.sizes.max as f64 / MIB);

    if !r.small_files.is_empty() {
        println!("\nSuspiciously small files ({}):", r.small_files.len());
        for f in r.small_files.iter().take(MAX_LISTED_SMALL) {
            println!("  - {}: {:.1} KB", f.name, f.size as f64 / 1024.0);
        }
    }

    println!("\n{RULE}");
    if r.passed() {
        println!("FINAL VERDICT: ALL CHECKS PASSED");
        println!("All {} songs downloaded successfully.", r.target_count());
        return;
    }
    println!("FINAL VERDICT: Some issues detected");
    if !r.count_ok() {
        println!(
            "  - Wrong count: {} instead of {}",
            r.found.len(),
            r.target_count()
        );
    }
    if !r.missing.is_empty() {
        println!("  - Missing files: {}", r.missing.len());
    }
    if !r.extra.is_empty() {
        println!("  - Extra files: {}", r.extra.len());
    }
    if !r.small_files.is_empty() {
        println!("  - Suspiciously small files: {}", r.small_files.len());
    }
}

pub async fn run_verify(cfg: &ScmConfig, include_remixes: bool) -> Result<()> {
    println!("Verifying Soundtrack Downloads");
    println!("{RULE}");
    println!("\nFetching expected song list from {}...", cfg.site.game_url());

    let songs = fetch_listing(&cfg.site, include_remixes).await?;
    println!("Found {} expected songs on the website", songs.len());

    let names: Vec<String> = songs.into_iter().map(|s| s.name).collect();
    let report = verify::build_report(&names, &cfg.paths.brstm_dir, &cfg.verify)?;
    println!(
        "\nFound {} BRSTM files in {}",
        report.found.len(),
        cfg.paths.brstm_dir.display()
    );

    print_report(&report, include_remixes);
    Ok(())
}
