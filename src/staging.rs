use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A uniquely named local file used as the source or destination of an scp
/// round-trip. Removed from disk when dropped.
pub struct StagedFile {
    file: NamedTempFile,
    abs_path: PathBuf,
}

impl StagedFile {
    pub fn empty(prefix: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile()
            .with_context(|| format!("failed to create staging file {}*", prefix))?;
        let abs_path = std::path::absolute(file.path()).with_context(|| {
            format!("failed to resolve staging path {}", file.path().display())
        })?;
        tracing::debug!(path = %abs_path.display(), "staged local file");
        Ok(Self { file, abs_path })
    }

    pub fn with_contents(prefix: &str, contents: &[u8]) -> Result<Self> {
        let mut staged = Self::empty(prefix)?;
        let path = staged.abs_path.display().to_string();
        staged
            .file
            .write_all(contents)
            .with_context(|| format!("failed to write {}", path))?;
        staged
            .file
            .flush()
            .with_context(|| format!("failed to flush {}", path))?;
        Ok(staged)
    }

    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// The path as a CLI argument. Errors on non-UTF-8 temp dirs.
    pub fn arg(&self) -> Result<&str> {
        self.abs_path()
            .to_str()
            .with_context(|| format!("staging path is not UTF-8: {}", self.abs_path.display()))
    }

    /// Reads the file fresh from disk, picking up anything an external
    /// process wrote to it.
    pub fn read_contents(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.abs_path)
            .with_context(|| format!("failed to read {}", self.abs_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_readable_before_upload() {
        let staged = StagedFile::with_contents("logfile", b"test-blackbox-message").unwrap();
        assert_eq!(staged.read_contents().unwrap(), b"test-blackbox-message".to_vec());
    }

    #[test]
    fn path_is_absolute_and_prefixed() {
        let staged = StagedFile::empty("auth.log").unwrap();
        assert!(staged.abs_path().is_absolute());
        let name = staged.abs_path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("auth.log"), "{}", name);
        assert_eq!(staged.arg().unwrap(), staged.abs_path().to_str().unwrap());
    }

    #[test]
    fn names_are_unique() {
        let a = StagedFile::empty("logfile").unwrap();
        let b = StagedFile::empty("logfile").unwrap();
        assert_ne!(a.abs_path(), b.abs_path());
    }

    #[test]
    fn sees_external_writes() {
        let staged = StagedFile::empty("auth.log").unwrap();
        std::fs::write(staged.abs_path(), "downloaded").unwrap();
        assert_eq!(staged.read_contents().unwrap(), b"downloaded".to_vec());
    }

    #[test]
    fn removed_on_drop() {
        let staged = StagedFile::with_contents("logfile", b"x").unwrap();
        let path = staged.abs_path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }
}
