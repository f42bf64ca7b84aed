use std::path::Path;

use crate::deadline::{Deadline, DeadlineExceeded};

/// Errors that can occur while downloading or extracting a repository archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("network error: {0}")]
    Network(String),

    #[error("archive download returned HTTP {0}")]
    HttpStatus(u16),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("archive entry escapes destination: {0}")]
    UnsafePath(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<DeadlineExceeded> for ArchiveError {
    fn from(_: DeadlineExceeded) -> Self {
        Self::DeadlineExceeded
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Downloads a repository archive to a local file.
#[async_trait::async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch `url` into `dest`, creating or truncating it.
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path, deadline: Deadline) -> Result<u64, ArchiveError>;
}

#[async_trait::async_trait]
impl<T: ArchiveFetcher + ?Sized> ArchiveFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str, dest: &Path, deadline: Deadline) -> Result<u64, ArchiveError> {
        (**self).fetch(url, dest, deadline).await
    }
}
