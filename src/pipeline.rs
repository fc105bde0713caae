//! A complete build: discover modules, scan them, write the generated file.

use anyhow::{Context, Result};
use glob::Pattern;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fs::FileSystem;
use crate::scanner::{self, ModuleScan};
use crate::session::{BuildSession, EmitReport};

/// Error encountered for a single module or input pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub file_path: String,
    pub message: String,
}

/// Summary of the parse phase of one build
#[derive(Debug, Default)]
pub struct ScanReport {
    pub modules_scanned: usize,
    pub calls_recorded: usize,
    /// Call sites whose source text could not be recovered
    pub calls_skipped: usize,
    pub warning_count: usize,
    pub errors: Vec<ScanError>,
}

/// Summary of a finished build
#[derive(Debug)]
pub struct BuildReport {
    pub scan: ScanReport,
    pub emit: EmitReport,
}

/// Per-module outcome of the parallel parse (no shared state between threads)
enum ModuleResult {
    Scanned(ModuleScan),
    Unreadable(ScanError),
}

/// Expand `patterns`, dropping directories and anything matched by `ignore`.
///
/// Paths are sorted so every build visits modules in the same order.
pub fn discover_modules<F: FileSystem + ?Sized>(
    fs: &F,
    patterns: &[String],
    ignore: &[String],
) -> Result<(Vec<PathBuf>, Vec<ScanError>)> {
    let ignore_matchers = compile_ignore_patterns(ignore)?;
    let mut paths = BTreeSet::new();
    let mut errors = Vec::new();

    for pattern in patterns {
        let matches =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;

        for entry in matches {
            match entry {
                Ok(path) => {
                    if fs.is_file(&path) && !matches_ignore_path(&path, &ignore_matchers) {
                        paths.insert(path);
                    }
                }
                Err(e) => errors.push(ScanError {
                    file_path: pattern.clone(),
                    message: format!("Glob error: {}", e),
                }),
            }
        }
    }

    Ok((paths.into_iter().collect(), errors))
}

/// Parse phase: scan every module in `config.input` and feed the watched
/// calls to `session`.
///
/// Modules are parsed in parallel, then recorded in path order so the
/// generated file is identical between builds of the same sources.
pub fn scan_into<F: FileSystem + ?Sized>(
    session: &BuildSession,
    config: &Config,
    fs: &F,
) -> Result<ScanReport> {
    let (mut paths, glob_errors) = discover_modules(fs, &config.input, &config.ignore)?;

    // The file a previous build wrote must never feed the next one
    if let Some(previous) = previous_output(fs, config) {
        paths.retain(|path| {
            let is_output = fs.canonicalize(path).is_ok_and(|path| path == previous);
            if is_output {
                debug!(path = %path.display(), "skipping generated translations file");
            }
            !is_output
        });
    }
    debug!(modules = paths.len(), "discovered modules");

    let results: Vec<ModuleResult> = paths
        .par_iter()
        .map(|path| match fs.read_to_string(path) {
            Ok(source) => ModuleResult::Scanned(scanner::scan_source(&source, path)),
            Err(e) => ModuleResult::Unreadable(ScanError {
                file_path: path.display().to_string(),
                message: format!("{:#}", e),
            }),
        })
        .collect();

    let mut report = ScanReport::default();
    for error in glob_errors {
        warn!("{}: {}", error.file_path, error.message);
        report.warning_count += 1;
        report.errors.push(error);
    }

    for result in results {
        match result {
            ModuleResult::Scanned(scan) => {
                report.modules_scanned += 1;
                if let Some(message) = scan.parse_error {
                    report.warning_count += 1;
                    report.errors.push(ScanError {
                        file_path: scan.path,
                        message,
                    });
                    continue;
                }
                for site in &scan.sites {
                    if session.record_call(Some(&scan.source), site.range) {
                        report.calls_recorded += 1;
                    } else {
                        report.calls_skipped += 1;
                    }
                }
            }
            ModuleResult::Unreadable(error) => {
                // Not valid UTF-8 or gone since discovery: no source text to slice
                warn!("Skipping {}: {}", error.file_path, error.message);
                report.warning_count += 1;
                report.errors.push(error);
            }
        }
    }

    Ok(report)
}

/// Run one build: a fresh session, the parse phase over all modules, then
/// emission into `config.output_dir` (created if missing).
pub fn run_build<F: FileSystem + ?Sized>(config: &Config, fs: &F) -> Result<BuildReport> {
    config.validate()?;
    let session = BuildSession::new(config.output_name()?);

    let scan = scan_into(&session, config, fs)?;

    let output_dir = Path::new(&config.output_dir);
    fs.create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    let emit = session.emit(fs, output_dir)?;

    info!(
        modules = scan.modules_scanned,
        calls = scan.calls_recorded,
        warnings = scan.warning_count,
        "build finished"
    );

    Ok(BuildReport { scan, emit })
}

/// Canonical path of the generated file, if one is already on disk.
fn previous_output<F: FileSystem + ?Sized>(fs: &F, config: &Config) -> Option<PathBuf> {
    let path = Path::new(&config.output_dir).join(&config.output);
    fs.canonicalize(&path).ok()
}

fn matches_ignore_path(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    let mut compiled = Vec::new();
    for pattern in patterns {
        let matcher = Pattern::new(pattern)
            .with_context(|| format!("Invalid ignore glob pattern: {}", pattern))?;
        compiled.push(matcher);
    }
    Ok(compiled)
}
