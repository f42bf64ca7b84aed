use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::{ArchiveError, ArchiveFetcher, Deadline};

/// Fetcher that writes a fixed body instead of touching the network.
/// Records every requested URL.
pub struct StaticArchiveFetcher {
    body: Result<Vec<u8>, u16>,
    requests: Mutex<Vec<String>>,
    write_delay: Option<Duration>,
}

impl StaticArchiveFetcher {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Ok(body.into()),
            requests: Mutex::new(Vec::new()),
            write_delay: None,
        }
    }

    /// Fetcher that fails every request with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            body: Err(status),
            requests: Mutex::new(Vec::new()),
            write_delay: None,
        }
    }

    /// Block the calling thread for `delay` after the body is written.
    /// Stands in for a fetch that hogs its worker until it completes.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ArchiveFetcher for StaticArchiveFetcher {
    async fn fetch(&self, url: &str, dest: &Path, deadline: Deadline) -> Result<u64, ArchiveError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_owned());
        }
        deadline.check()?;

        let body = self.body.as_ref().map_err(|status| ArchiveError::HttpStatus(*status))?;
        std::fs::write(dest, body)?;
        if let Some(delay) = self.write_delay {
            std::thread::sleep(delay);
        }
        Ok(body.len() as u64)
    }
}
