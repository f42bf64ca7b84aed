pub mod archive;
pub mod extract;

pub use archive::{ArchiveClient, ArchiveClientConfig};
pub use extract::{ExtractSummary, extract_archive};
