use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid file name `{0}`")]
    InvalidFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Directory the dashboard writes pages, exports and preferences into.
///
/// Every write goes through a temp file in the same directory followed by a
/// rename, so readers never observe a half-written page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates the directory if missing and checks that we can write to it.
    pub fn ensure(&self) -> Result<(), PersistError> {
        if self.root.exists() {
            let meta =
                fs::metadata(&self.root).map_err(|e| PersistError::OutputDir(e.to_string()))?;
            if !meta.is_dir() {
                return Err(PersistError::OutputDir(format!(
                    "{} is not a directory",
                    self.root.display()
                )));
            }
        } else {
            fs::create_dir_all(&self.root).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        }
        NamedTempFile::new_in(&self.root).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        Ok(())
    }

    /// Writes `content` to `filename`. The directory must already exist; call
    /// [`OutputDir::ensure`] once up front.
    pub fn write_atomic(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let target = self.resolve(filename)?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| {
            PersistError::OutputDir(format!("{}: {e}", self.root.display()))
        })?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    /// Contents of `filename`, or `None` when it does not exist yet.
    pub fn read(&self, filename: &str) -> Result<Option<String>, PersistError> {
        let target = self.resolve(filename)?;
        match fs::read_to_string(&target) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf, PersistError> {
        let valid = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\']);
        if !valid {
            return Err(PersistError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}
