use anyhow::Result;
use clap::{Parser, Subcommand};
use drupal_translations::commands;
use drupal_translations::config::{Config, DEFAULT_OUTPUT};
use drupal_translations::logging::{self, LogLevel};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drupal-translations")]
#[command(author, version, about = "Collect Drupal.t and Drupal.formatPlural calls for Drupal's translation scanner", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (silent, error, warn, info, debug)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan source modules and write the translations file
    Scan {
        /// Build output directory (overrides config)
        #[arg(short = 'd', long)]
        out_dir: Option<String>,

        /// Generated file name (overrides config)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Rebuild the translations file whenever a source module changes
    Watch {
        /// Build output directory (overrides config)
        #[arg(short = 'd', long)]
        out_dir: Option<String>,

        /// Generated file name (overrides config)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Create a drupal-translations.json configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,

        /// Comma-separated input glob patterns
        #[arg(long, default_value = "src/**/*.js,src/**/*.jsx,src/**/*.ts,src/**/*.tsx")]
        input: String,

        /// Build output directory
        #[arg(long, default_value = "dist")]
        out_dir: String,

        /// Generated file name
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    match cli.command {
        Commands::Scan { out_dir, output } => {
            let config = Config::load_or_default(cli.config.as_ref())?.with_overrides(out_dir, output)?;
            commands::scan::run(&config)?;
        }
        Commands::Watch { out_dir, output } => {
            let config = Config::load_or_default(cli.config.as_ref())?.with_overrides(out_dir, output)?;
            commands::watch::run(config)?;
        }
        Commands::Init {
            force,
            input,
            out_dir,
            output,
        } => {
            commands::init::run(force, &input, &out_dir, &output)?;
        }
    }

    Ok(())
}
