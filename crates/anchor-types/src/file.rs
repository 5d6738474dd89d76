use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::TypeError;

/// A filesystem path that named an existing regular file when it was opened.
///
/// Symlinks are followed, so a link to a regular file is accepted and a
/// directory or dangling link is not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReference {
    path: PathBuf,
    file_name: String,
}

impl FileReference {
    /// Validate `path` and capture its base name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TypeError> {
        let path = path.as_ref();
        let is_file = std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            return Err(TypeError::NotARegularFile(path.to_path_buf()));
        }
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TypeError::MissingFileName(path.to_path_buf()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
        })
    }

    /// The path as supplied by the caller.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name only. The ledger never learns the directory layout.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
