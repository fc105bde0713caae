//! Per-build state: collect watched calls while modules are parsed, then
//! write the generated translations file once at emission time.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::collector::CallCollector;
use crate::config::OutputName;
use crate::fs::FileSystem;
use crate::render::{join_calls, render_output};
use crate::slice::{slice_source, SourceRange};

/// The two translation functions whose call sites are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedFunction {
    /// `Drupal.t(string, args, options)`
    Translate,
    /// `Drupal.formatPlural(count, singular, plural, args, options)`
    FormatPlural,
}

impl WatchedFunction {
    pub const ALL: [WatchedFunction; 2] = [WatchedFunction::Translate, WatchedFunction::FormatPlural];

    /// Object the functions hang off.
    pub const OBJECT: &'static str = "Drupal";

    pub fn property(self) -> &'static str {
        match self {
            WatchedFunction::Translate => "t",
            WatchedFunction::FormatPlural => "formatPlural",
        }
    }

    pub fn qualified_name(self) -> &'static str {
        match self {
            WatchedFunction::Translate => "Drupal.t",
            WatchedFunction::FormatPlural => "Drupal.formatPlural",
        }
    }

    pub fn from_qualified_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.qualified_name() == name)
    }

    /// Match an `object.property` pair as it appears at a call site.
    pub fn from_member(object: &str, property: &str) -> Option<Self> {
        if object != Self::OBJECT {
            return None;
        }
        Self::ALL.into_iter().find(|f| f.property() == property)
    }
}

/// A matched call expression inside one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub function: WatchedFunction,
    pub range: SourceRange,
}

/// What [`BuildSession::emit`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub path: PathBuf,
    pub call_count: usize,
    pub bytes_written: usize,
}

/// State of a single build.
///
/// Created empty when a build starts. [`record_call`](Self::record_call) may
/// be called from any thread while modules are parsed; [`emit`](Self::emit)
/// consumes the session, so the artifact is written at most once per build.
#[derive(Debug)]
pub struct BuildSession {
    output: OutputName,
    collector: CallCollector,
}

impl BuildSession {
    pub fn new(output: OutputName) -> Self {
        Self {
            output,
            collector: CallCollector::new(),
        }
    }

    pub fn output(&self) -> &OutputName {
        &self.output
    }

    /// Handle one matched call site.
    ///
    /// Slices the call out of the module's raw source and appends it. Returns
    /// `false` when the source is unavailable or the slice is empty; the site
    /// is then skipped without failing the build.
    pub fn record_call(&self, source: Option<&str>, range: SourceRange) -> bool {
        match slice_source(source, range) {
            Some(text) if !text.is_empty() => {
                self.collector.append(text);
                true
            }
            _ => {
                debug!(
                    start = range.start,
                    end = range.end,
                    has_source = source.is_some(),
                    "skipping call site without retrievable source text"
                );
                false
            }
        }
    }

    pub fn call_count(&self) -> usize {
        self.collector.len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.collector.snapshot()
    }

    /// Target path of the generated file for `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.output.as_str())
    }

    /// Render every collected call and write the generated file into
    /// `output_dir`, replacing any previous file.
    ///
    /// The directory must already exist. Any write failure is returned and
    /// must fail the build.
    pub fn emit<F: FileSystem + ?Sized>(self, fs: &F, output_dir: &Path) -> Result<EmitReport> {
        let path = self.output_path(output_dir);
        let calls = self.collector.into_calls();
        let content = render_output(&join_calls(&calls));

        fs.atomic_write(&path, content.as_bytes())
            .with_context(|| format!("Failed to write translations file: {}", path.display()))?;

        info!(
            path = %path.display(),
            calls = calls.len(),
            "wrote translations file"
        );

        Ok(EmitReport {
            path,
            call_count: calls.len(),
            bytes_written: content.len(),
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already emitted")]
    AlreadyEmitted,
}

/// A [`BuildSession`] fed one call at a time by a bundler plugin.
///
/// Offsets arrive as JavaScript string indices (UTF-16 code units). After
/// [`emit`](Self::emit) every further use fails with
/// [`SessionError::AlreadyEmitted`].
#[derive(Debug)]
pub struct PluginSession {
    inner: Option<BuildSession>,
}

impl PluginSession {
    pub fn new(output: OutputName) -> Self {
        Self {
            inner: Some(BuildSession::new(output)),
        }
    }

    /// Record the call spanning UTF-16 indices `start..end` of `source`.
    /// Returns `Ok(false)` when the call was skipped.
    pub fn record_call(
        &self,
        source: Option<&str>,
        start: usize,
        end: usize,
    ) -> Result<bool, SessionError> {
        let session = self.session()?;

        let Some(source) = source else {
            return Ok(session.record_call(None, SourceRange::new(start, end)));
        };
        match SourceRange::from_utf16(source, start, end) {
            Some(range) => Ok(session.record_call(Some(source), range)),
            None => {
                debug!(start, end, "call range does not fit the module source");
                Ok(false)
            }
        }
    }

    pub fn call_count(&self) -> Result<usize, SessionError> {
        Ok(self.session()?.call_count())
    }

    /// Write the generated file. Succeeds at most once per session, even when
    /// the write itself fails.
    pub fn emit<F: FileSystem + ?Sized>(&mut self, fs: &F, output_dir: &Path) -> Result<EmitReport> {
        let session = self.inner.take().ok_or(SessionError::AlreadyEmitted)?;
        session.emit(fs, output_dir)
    }

    fn session(&self) -> Result<&BuildSession, SessionError> {
        self.inner.as_ref().ok_or(SessionError::AlreadyEmitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::InMemoryFileSystem;
    use crate::render::PLUGIN_NAME;

    fn session() -> BuildSession {
        BuildSession::new(OutputName::default())
    }

    fn range_of(source: &str, needle: &str) -> SourceRange {
        let start = source.find(needle).unwrap();
        SourceRange::new(start, start + needle.len())
    }

    #[test]
    fn test_watched_function_names() {
        assert_eq!(
            WatchedFunction::from_qualified_name("Drupal.t"),
            Some(WatchedFunction::Translate)
        );
        assert_eq!(
            WatchedFunction::from_qualified_name("Drupal.formatPlural"),
            Some(WatchedFunction::FormatPlural)
        );
        assert_eq!(WatchedFunction::from_qualified_name("Drupal.theme"), None);
        assert_eq!(
            WatchedFunction::from_member("Drupal", "formatPlural"),
            Some(WatchedFunction::FormatPlural)
        );
        assert_eq!(WatchedFunction::from_member("drupal", "t"), None);
    }

    #[test]
    fn test_record_call_slices_source() {
        let source = "var a = Drupal.t('Hello');";
        let session = session();
        assert!(session.record_call(Some(source), range_of(source, "Drupal.t('Hello')")));
        assert_eq!(session.calls(), vec!["Drupal.t('Hello')".to_string()]);
    }

    #[test]
    fn test_record_call_skips_missing_source() {
        let session = session();
        assert!(!session.record_call(None, SourceRange::new(0, 10)));
        assert_eq!(session.call_count(), 0);
    }

    #[test]
    fn test_record_call_skips_empty_slice() {
        let session = session();
        assert!(!session.record_call(Some("abc"), SourceRange::new(1, 1)));
        assert_eq!(session.call_count(), 0);
    }

    #[test]
    fn test_emit_writes_rendered_file() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("dist")).unwrap();

        let source = "Drupal.t('Hello');\nDrupal.formatPlural(n, '1 item', '@count items');";
        let session = session();
        session.record_call(Some(source), range_of(source, "Drupal.t('Hello')"));
        session.record_call(
            Some(source),
            range_of(source, "Drupal.formatPlural(n, '1 item', '@count items')"),
        );

        let report = session.emit(&fs, Path::new("dist")).unwrap();
        assert_eq!(report.path, PathBuf::from("dist/drupalTranslations.js"));
        assert_eq!(report.call_count, 2);

        let written = fs.get_files()[Path::new("dist/drupalTranslations.js")].clone();
        assert_eq!(report.bytes_written, written.len());
        assert!(written.contains(&format!(
            "function {} () {{\n  Drupal.t('Hello')\n  Drupal.formatPlural(n, '1 item', '@count items')\n}}\n",
            PLUGIN_NAME
        )));
    }

    #[test]
    fn test_emit_normalizes_multiline_calls() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("dist")).unwrap();

        let source = "Drupal.t(\n  'Multi line'\n)";
        let session = session();
        session.record_call(Some(source), SourceRange::new(0, source.len()));
        session.emit(&fs, Path::new("dist")).unwrap();

        let written = fs.get_files()[Path::new("dist/drupalTranslations.js")].clone();
        assert!(written.contains("\n  Drupal.t(  'Multi line')\n}"));
    }

    #[test]
    fn test_emit_without_calls_writes_empty_body() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("dist")).unwrap();

        let report = session().emit(&fs, Path::new("dist")).unwrap();
        assert_eq!(report.call_count, 0);

        let written = fs.get_files()[Path::new("dist/drupalTranslations.js")].clone();
        assert!(written.ends_with(&format!("function {} () {{\n  \n}}\n", PLUGIN_NAME)));
    }

    #[test]
    fn test_emit_custom_output_name() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("build")).unwrap();

        let session = BuildSession::new(OutputName::parse("custom.js").unwrap());
        let report = session.emit(&fs, Path::new("build")).unwrap();
        assert_eq!(report.path, PathBuf::from("build/custom.js"));
        assert!(fs.exists(Path::new("build/custom.js")));
        assert!(!fs.exists(Path::new("build/drupalTranslations.js")));
    }

    #[test]
    fn test_emit_overwrites_existing_file() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("dist/drupalTranslations.js", "stale");

        session().emit(&fs, Path::new("dist")).unwrap();
        let written = fs.get_files()[Path::new("dist/drupalTranslations.js")].clone();
        assert_ne!(written, "stale");
    }

    #[test]
    fn test_emit_into_missing_directory_fails() {
        let fs = InMemoryFileSystem::new();
        let err = session().emit(&fs, Path::new("missing")).unwrap_err();
        assert!(err.to_string().contains("missing/drupalTranslations.js"));
    }

    #[test]
    fn test_emit_keeps_duplicates() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("dist")).unwrap();

        let source = "Drupal.t('same')";
        let session = session();
        session.record_call(Some(source), SourceRange::new(0, source.len()));
        session.record_call(Some(source), SourceRange::new(0, source.len()));
        let report = session.emit(&fs, Path::new("dist")).unwrap();
        assert_eq!(report.call_count, 2);

        let written = fs.get_files()[Path::new("dist/drupalTranslations.js")].clone();
        assert_eq!(written.matches("Drupal.t('same')").count(), 2);
    }

    #[test]
    fn test_plugin_session_converts_utf16_offsets() {
        // "é" is one UTF-16 unit but two bytes, "😀" two units and four bytes
        let source = "var s = 'é😀'; Drupal.t('Grüße');";
        let start = source[..source.find("Drupal").unwrap()].encode_utf16().count();
        let end = start + "Drupal.t('Grüße')".encode_utf16().count();

        let plugin = PluginSession::new(OutputName::default());
        assert_eq!(plugin.record_call(Some(source), start, end), Ok(true));
        assert_eq!(plugin.call_count(), Ok(1));
        assert_eq!(
            plugin.session().unwrap().calls(),
            vec!["Drupal.t('Grüße')".to_string()]
        );
    }

    #[test]
    fn test_plugin_session_skips_ranges_outside_source() {
        let plugin = PluginSession::new(OutputName::default());
        assert_eq!(plugin.record_call(Some("Drupal.t('a')"), 0, 99), Ok(false));
        assert_eq!(plugin.record_call(Some("Drupal.t('a')"), 5, 2), Ok(false));
        assert_eq!(plugin.record_call(None, 0, 5), Ok(false));
        // Second half of a surrogate pair
        assert_eq!(plugin.record_call(Some("😀Drupal.t('a')"), 1, 15), Ok(false));
        assert_eq!(plugin.call_count(), Ok(0));
    }

    #[test]
    fn test_plugin_session_emits_once() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("dist")).unwrap();

        let mut plugin = PluginSession::new(OutputName::default());
        plugin.record_call(Some("Drupal.t('x')"), 0, 13).unwrap();
        let report = plugin.emit(&fs, Path::new("dist")).unwrap();
        assert_eq!(report.call_count, 1);

        let err = plugin.emit(&fs, Path::new("dist")).unwrap_err();
        assert_eq!(err.to_string(), "Session already emitted");
        assert_eq!(
            plugin.record_call(Some("Drupal.t('x')"), 0, 13),
            Err(SessionError::AlreadyEmitted)
        );
        assert_eq!(plugin.call_count(), Err(SessionError::AlreadyEmitted));
    }
}
