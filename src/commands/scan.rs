use anyhow::Result;

use crate::config::Config;
use crate::fs::RealFileSystem;
use crate::pipeline;

pub fn run(config: &Config) -> Result<()> {
    println!("=== drupal-translations scan ===\n");

    println!("Configuration:");
    println!("  Input patterns: {:?}", config.input);
    println!("  Ignore patterns: {:?}", config.ignore);
    println!("  Output directory: {}", config.output_dir);
    println!("  Output file: {}", config.output);
    println!();

    let report = pipeline::run_build(config, &RealFileSystem)?;

    // Report any errors encountered while scanning
    if !report.scan.errors.is_empty() {
        eprintln!("Scan warnings:");
        for error in &report.scan.errors {
            eprintln!("  {}: {}", error.file_path, error.message);
        }
        eprintln!();
    }

    println!("Scan Summary:");
    println!("  Modules scanned: {}", report.scan.modules_scanned);
    println!("  Calls extracted: {}", report.scan.calls_recorded);
    if report.scan.calls_skipped > 0 {
        println!("  Calls skipped (no source): {}", report.scan.calls_skipped);
    }
    if report.scan.warning_count > 0 {
        println!("  Warnings: {}", report.scan.warning_count);
    }

    println!("\nWrote {}", report.emit.path.display());
    println!("\nDone!");

    Ok(())
}
