use std::path::Path;
use std::time::Duration;

use repo_tree::{ArchiveError, ArchiveFetcher, Deadline};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

/// Settings for [`ArchiveClient`].
#[derive(Debug, Clone)]
pub struct ArchiveClientConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
}

impl Default for ArchiveClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "repo-tree".into(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for downloading GitHub repository zip archives to disk.
///
/// One GET per archive URL, no retries. The body is streamed to the
/// destination file chunk by chunk rather than buffered in memory.
pub struct ArchiveClient {
    client: reqwest::Client,
}

impl ArchiveClient {
    pub fn new(config: ArchiveClientConfig) -> Result<Self, ArchiveError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ArchiveError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ArchiveFetcher for ArchiveClient {
    async fn fetch(&self, url: &str, dest: &Path, deadline: Deadline) -> Result<u64, ArchiveError> {
        let mut response = timeout(deadline.remaining(), self.client.get(url).send())
            .await
            .map_err(|_| ArchiveError::DeadlineExceeded)?
            .map_err(|e| ArchiveError::Network(format!("archive download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ArchiveError::HttpStatus(response.status().as_u16()));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = timeout(deadline.remaining(), response.chunk())
            .await
            .map_err(|_| ArchiveError::DeadlineExceeded)?
            .map_err(|e| ArchiveError::Network(format!("failed to read archive body: {e}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}
