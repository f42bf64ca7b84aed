use serde::{Deserialize, Serialize};

/// One filesystem entry in a repository tree.
///
/// `children` is only ever populated for directories. An empty list is
/// omitted from the serialized form rather than written as `[]` or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            children: Vec::new(),
        }
    }

    pub fn dir(name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            children,
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(FileNode::node_count).sum::<usize>()
    }

    /// Look up a descendant by a `/`-separated path relative to this node.
    /// An empty path returns `self`.
    pub fn find(&self, relative_path: &str) -> Option<&FileNode> {
        relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| {
                node.children.iter().find(|child| child.name == segment)
            })
    }

    /// Sort every directory's children by name, recursively.
    pub fn sort_recursive(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.sort_recursive();
        }
    }
}
