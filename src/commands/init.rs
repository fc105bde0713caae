use anyhow::{bail, Result};
use std::path::Path;

use crate::config::{Config, DEFAULT_CONFIG_FILE};

pub fn run(force: bool, input: &str, output_dir: &str, output: &str) -> Result<()> {
    println!("=== drupal-translations init ===\n");

    let config_path = Path::new(DEFAULT_CONFIG_FILE);

    // Check if config already exists
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    // Parse comma-separated values
    let input_patterns: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    // Validate before anything is written
    let defaults = Config::default();
    Config {
        input: input_patterns.clone(),
        output_dir: output_dir.to_string(),
        output: output.to_string(),
        ..defaults.clone()
    }
    .validate()?;

    let config = serde_json::json!({
        "input": input_patterns,
        "ignore": defaults.ignore,
        "outputDir": output_dir,
        "output": output,
    });

    let config_str = serde_json::to_string_pretty(&config)?;
    std::fs::write(config_path, format!("{}\n", config_str))?;

    println!("Created configuration file: {}\n", config_path.display());
    println!("Configuration:");
    println!("  Input patterns: {:?}", input_patterns);
    println!("  Output directory: {}", output_dir);
    println!("  Output file: {}", output);

    println!("\nNext steps:");
    println!("  1. Run 'drupal-translations scan' after each build");
    println!("  2. Run 'drupal-translations watch' during development");
    println!("  3. Add {} to your library's js files", output);

    Ok(())
}
