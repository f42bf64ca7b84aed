pub mod archive;
pub mod deadline;
pub mod feedback;
pub mod node;
pub mod tree;
pub mod url;

pub use archive::{ArchiveError, ArchiveFetcher};
pub use deadline::{Deadline, DeadlineExceeded};
pub use feedback::Feedback;
pub use node::FileNode;
pub use tree::{TreeBuilder, TreeError, TreeReport, build_tree};
pub use url::{DEFAULT_BRANCH, GITHUB_ARCHIVE_BASE, GITHUB_PREFIX, RepoRef, convert_github_to_zip_url};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
