use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::fs::RealFileSystem;
use crate::pipeline::{self, BuildReport};

const SOURCE_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];

/// Re-runs a complete build whenever a source module changes.
///
/// Every rebuild starts from an empty session; nothing is cached between
/// builds.
pub struct FileWatcher {
    config: Config,
    debounce_duration: Duration,
}

impl FileWatcher {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            debounce_duration: Duration::from_millis(300),
        }
    }

    /// Run the file watcher, blocking until interrupted
    pub fn run(&mut self) -> Result<()> {
        let (tx, rx) = channel();

        let mut debouncer = new_debouncer(self.debounce_duration, tx)
            .context("Failed to create file watcher")?;

        let watch_dirs = compute_watch_dirs(&self.config.input);

        if watch_dirs.is_empty() {
            anyhow::bail!("No valid directories found to watch from input patterns");
        }

        for dir in &watch_dirs {
            info!("Watching: {}", dir.display());
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;
        }

        // Initial build; a failure here is fatal like any build
        self.rebuild()?;
        info!("Watching for changes... (Ctrl+C to stop)");

        // Channel closes when the debouncer is dropped
        while let Ok(result) = rx.recv() {
            self.handle_events(result);
        }

        Ok(())
    }

    fn handle_events(&mut self, result: DebounceEventResult) {
        let events = match result {
            Ok(events) => events,
            Err(error) => {
                error!("Watch error: {:?}", error);
                return;
            }
        };

        let output_path = canonical_or_self(
            &Path::new(&self.config.output_dir).join(&self.config.output),
        );
        let changed = changed_sources(events.into_iter().map(|event| event.path), &output_path);

        if changed.is_empty() {
            return;
        }

        for path in &changed {
            info!("Changed: {}", path.display());
        }

        // Keep watching after a failed rebuild; the next change retries
        if let Err(e) = self.rebuild() {
            error!("Build failed: {:#}", e);
        }
    }

    fn rebuild(&self) -> Result<BuildReport> {
        let report = pipeline::run_build(&self.config, &RealFileSystem)?;
        info!(
            "Wrote {} ({} call(s) from {} module(s))",
            report.emit.path.display(),
            report.emit.call_count,
            report.scan.modules_scanned
        );
        Ok(report)
    }
}

/// Non-glob prefix of each input pattern, e.g. `src/**/*.js` -> `src`
fn compute_watch_dirs(patterns: &[String]) -> Vec<PathBuf> {
    let mut dirs = HashSet::new();

    for pattern in patterns {
        let mut prefix = PathBuf::new();

        for component in Path::new(pattern).components() {
            let part = component.as_os_str().to_string_lossy();
            if part.contains(['*', '?', '[']) {
                break;
            }
            prefix.push(component);
        }

        if prefix.as_os_str().is_empty() {
            prefix.push(".");
        }

        if prefix.is_dir() {
            dirs.insert(prefix.canonicalize().unwrap_or(prefix));
        }
    }

    let mut dirs: Vec<PathBuf> = dirs.into_iter().collect();
    dirs.sort();
    dirs
}

/// Source modules among `paths`, sorted and deduplicated, without the
/// generated file so writing it never triggers another build.
fn changed_sources(paths: impl IntoIterator<Item = PathBuf>, output_path: &Path) -> Vec<PathBuf> {
    let mut changed: Vec<PathBuf> = paths
        .into_iter()
        .filter(|path| should_process_file(path) && canonical_or_self(path) != output_path)
        .collect();
    changed.sort();
    changed.dedup();
    changed
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn should_process_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
