use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Abstraction over file system operations for testing
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Replace a file's contents in one step. The parent directory must exist.
    fn atomic_write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Check if a path is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Absolute path with every `.`, `..` and symlink resolved. Fails when
    /// the path does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// Real file system implementation using std::fs
#[derive(Debug, Default, Clone)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn atomic_write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        // The temp file lives next to the target so the rename never crosses mounts
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(contents)?;
        tmp.flush()?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(std::fs::canonicalize(path)?)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }
}
