use std::path::PathBuf;

/// Errors raised while building an index.
///
/// Only [`IndexError::InvalidRoot`] aborts [`crate::indexer::build_index`].
/// The other variants are produced per file or per directory, logged, and
/// then treated as "no records for that unit".
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid root directory: {} (does not exist or is not a directory)", .path.display())]
    InvalidRoot { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory: {0}")]
    DirectoryRead(#[from] ignore::Error),
}

impl IndexError {
    /// True for the one error that stops a whole index build.
    pub fn is_invalid_root(&self) -> bool {
        matches!(self, IndexError::InvalidRoot { .. })
    }
}
