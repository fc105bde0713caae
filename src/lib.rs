pub mod collector;
pub mod commands;
pub mod config;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod scanner;
pub mod session;
pub mod slice;
pub mod watcher;

#[cfg(feature = "napi")]
use napi::bindgen_prelude::*;
#[cfg(feature = "napi")]
use napi_derive::napi;

#[cfg(feature = "napi")]
use crate::config::{Config, NapiConfig, OutputName};
#[cfg(feature = "napi")]
use crate::fs::RealFileSystem;
#[cfg(feature = "napi")]
use crate::session::PluginSession;

/// Scan source files and write the translations file in one call
///
/// # Arguments
/// * `config` - Configuration object
///
/// # Returns
/// Returns a JSON string with the build summary
#[napi]
#[cfg(feature = "napi")]
pub fn build(config: NapiConfig) -> Result<String> {
    let config: Config = Config::from_napi(config)
        .map_err(|e| napi::Error::from_reason(format!("Config validation failed: {:#}", e)))?;

    let report = crate::pipeline::run_build(&config, &RealFileSystem)
        .map_err(|e| napi::Error::from_reason(format!("Build failed: {:#}", e)))?;

    Ok(serde_json::json!({
        "success": true,
        "output_path": report.emit.path.display().to_string(),
        "modules_scanned": report.scan.modules_scanned,
        "calls": report.emit.call_count,
        "calls_skipped": report.scan.calls_skipped,
        "warnings": report.scan.warning_count,
        "errors": report.scan.errors.iter().map(|error| serde_json::json!({
            "file_path": error.file_path,
            "message": error.message,
        })).collect::<Vec<_>>(),
    })
    .to_string())
}

/// Build session driven by a webpack plugin.
///
/// The plugin creates one session per compilation, forwards every
/// `Drupal.t` / `Drupal.formatPlural` parser hook as `recordCall(source,
/// range[0], range[1])`, and calls `emit(compiler.outputPath)` from its
/// emit hook before invoking the hook callback.
#[cfg(feature = "napi")]
#[napi]
pub struct TranslationsSession {
    inner: PluginSession,
}

#[cfg(feature = "napi")]
#[napi]
impl TranslationsSession {
    #[napi(constructor)]
    pub fn new(output: Option<String>) -> Result<Self> {
        let output = match output {
            Some(name) => OutputName::parse(&name)
                .map_err(|e| napi::Error::from_reason(format!("Config validation failed: {}", e)))?,
            None => OutputName::default(),
        };
        Ok(Self {
            inner: PluginSession::new(output),
        })
    }

    /// Record one call site. `start` and `end` are JavaScript string indices
    /// into `source`. Returns false when the call was skipped.
    #[napi]
    pub fn record_call(&self, source: Option<String>, start: u32, end: u32) -> Result<bool> {
        self.inner
            .record_call(source.as_deref(), start as usize, end as usize)
            .map_err(|e| napi::Error::from_reason(e.to_string()))
    }

    /// Number of calls recorded so far
    #[napi(getter)]
    pub fn length(&self) -> Result<u32> {
        let count = self
            .inner
            .call_count()
            .map_err(|e| napi::Error::from_reason(e.to_string()))?;
        u32::try_from(count).map_err(|_| {
            napi::Error::from_reason(format!("Call count {} does not fit in u32", count))
        })
    }

    /// Write the translations file into `output_dir` and return its path.
    /// The session cannot be used afterwards.
    #[napi]
    pub fn emit(&mut self, output_dir: String) -> Result<String> {
        let report = self
            .inner
            .emit(&RealFileSystem, std::path::Path::new(&output_dir))
            .map_err(|e| napi::Error::from_reason(format!("Emit failed: {:#}", e)))?;
        Ok(report.path.display().to_string())
    }
}
