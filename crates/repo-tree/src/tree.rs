use std::path::Path;

use crate::deadline::Deadline;
use crate::feedback::Feedback;
use crate::node::FileNode;

/// Errors that abort a tree walk as a whole.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("deadline exceeded while walking the tree")]
    DeadlineExceeded,
}

/// Result of a walk: the tree (if the root could be statted) plus one
/// warning per dropped entry and one error per directory that could not be listed.
#[derive(Debug, Clone, Default)]
pub struct TreeReport {
    pub root: Option<FileNode>,
    pub feedback: Vec<Feedback>,
}

/// Recursively mirrors a directory on disk as a [`FileNode`] tree.
///
/// Entries that cannot be statted are left out of their parent rather than
/// failing the walk; each one is reported as a warning in [`TreeReport`].
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    sorted: bool,
    deadline: Option<Deadline>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            sorted: true,
            deadline: None,
        }
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort children by name. When off, children keep directory listing order.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Abort the walk once `deadline` passes. Checked before each directory read.
    pub fn deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(&self, path: &Path) -> Result<TreeReport, TreeError> {
        let mut feedback = Vec::new();
        let root = self.build_node(path, &mut feedback)?;
        Ok(TreeReport { root, feedback })
    }

    fn build_node(
        &self,
        path: &Path,
        feedback: &mut Vec<Feedback>,
    ) -> Result<Option<FileNode>, TreeError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                feedback.push(Feedback::skipped(path, e));
                return Ok(None);
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !metadata.is_dir() {
            return Ok(Some(FileNode::file(name)));
        }

        if let Some(deadline) = &self.deadline {
            deadline.check().map_err(|_| TreeError::DeadlineExceeded)?;
        }

        let mut children = Vec::new();
        match std::fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            feedback.push(Feedback::skipped(path, e));
                            continue;
                        }
                    };
                    if let Some(child) = self.build_node(&entry.path(), feedback)? {
                        children.push(child);
                    }
                }
            }
            // Unlistable directories are kept, just without children.
            Err(e) => feedback.push(Feedback::error(format!(
                "could not list {}: {e}",
                path.display()
            ))),
        }

        if self.sorted {
            children.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(Some(FileNode::dir(name, children)))
    }
}

/// Build a tree rooted at `path` in directory listing order.
/// Returns `None` if `path` itself cannot be statted.
pub fn build_tree(path: &Path) -> Option<FileNode> {
    TreeBuilder::new()
        .sorted(false)
        .build(path)
        .ok()
        .and_then(|report| report.root)
}
