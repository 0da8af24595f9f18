use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while storing or removing uploaded files.
#[derive(Debug)]
pub enum StorageError {
    /// The referenced file does not exist.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The bucket directory could not be created.
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The public reference does not point into a managed bucket.
    InvalidPath(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "upload not found: {path}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::DirectoryCreation { path, source } => {
                write!(
                    f,
                    "failed to create upload directory {}: {source}",
                    path.display()
                )
            }
            Self::InvalidPath(msg) => write!(f, "invalid upload path: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::DirectoryCreation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
