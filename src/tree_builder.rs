use crate::utils::normalize_separators;
use clap::ValueEnum;
use std::collections::HashMap;

/// Index of a node inside its [`FileTree`] arena.
pub type NodeId = usize;

/// How the first segment of a path is joined to the synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PathStyle {
    /// Paths start with a separator: `/home/me/a.txt`.
    #[default]
    Posix,
    /// The first segment stands alone: `C:/data/a.txt`.
    Windows,
}

impl PathStyle {
    /// Path of `segment` below `parent_path`, where `None` is the synthetic root.
    pub fn join(self, parent_path: Option<&str>, segment: &str) -> String {
        match (parent_path, self) {
            (None, PathStyle::Windows) => segment.to_string(),
            (None, PathStyle::Posix) => format!("/{}", segment),
            (Some(parent), _) => format!("{}/{}", parent, segment),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    File,
}

/// A path split into its non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    segments: Vec<String>,
}

impl PathEntry {
    pub fn parse(path: &str) -> Self {
        let segments = normalize_separators(path)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        PathEntry { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub kind: NodeKind,
    /// Display path up to and including this node.
    pub path: String,
    /// `Some` for folders (possibly empty), always `None` for files.
    pub children: Option<Vec<NodeId>>,
    pub parent: Option<NodeId>,
    /// Number of ancestors below the synthetic root.
    pub depth: usize,
}

impl FileNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

type ChildKey = (Option<NodeId>, String, NodeKind);

/// Folder/file tree built from a flat list of paths.
///
/// Nodes live in an arena; the synthetic root is implicit and its children are
/// [`FileTree::roots`]. Children keep first-seen order and are unique by
/// `(name, kind)` within their parent.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    style: PathStyle,
    nodes: Vec<FileNode>,
    roots: Vec<NodeId>,
    index: HashMap<ChildKey, NodeId>,
}

impl FileTree {
    pub fn new(style: PathStyle) -> Self {
        FileTree {
            style,
            ..FileTree::default()
        }
    }

    pub fn build<S: AsRef<str>>(paths: &[S], style: PathStyle) -> Self {
        let mut tree = FileTree::new(style);
        for path in paths {
            tree.insert(path.as_ref());
        }
        tree
    }

    /// Insert one path, reusing existing prefix nodes. Returns the ids of the
    /// nodes this call created, outermost first.
    pub fn insert(&mut self, path: &str) -> Vec<NodeId> {
        let entry = PathEntry::parse(path);
        let last = entry.len().saturating_sub(1);
        let mut created = Vec::new();
        let mut parent: Option<NodeId> = None;

        for (i, segment) in entry.segments().iter().enumerate() {
            let kind = if i == last {
                NodeKind::File
            } else {
                NodeKind::Folder
            };
            let id = match self.child(parent, segment, kind) {
                Some(existing) => existing,
                None => {
                    let new_id = self.push_node(parent, segment, kind);
                    created.push(new_id);
                    new_id
                }
            };
            parent = Some(id);
        }
        created
    }

    fn push_node(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        let (parent_path, depth) = match parent {
            Some(p) => (Some(self.nodes[p].path.as_str()), self.nodes[p].depth + 1),
            None => (None, 0),
        };
        let path = self.style.join(parent_path, name);

        self.nodes.push(FileNode {
            name: name.to_string(),
            kind,
            path,
            children: match kind {
                NodeKind::Folder => Some(Vec::new()),
                NodeKind::File => None,
            },
            parent,
            depth,
        });
        match parent {
            Some(p) => {
                if let Some(children) = self.nodes[p].children.as_mut() {
                    children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.index.insert((parent, name.to_string(), kind), id);
        id
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&FileNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[FileNode] {
        &self.nodes
    }

    /// Children of `id`; empty for files and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .and_then(|node| node.children.as_deref())
            .unwrap_or(&[])
    }

    /// Look up a direct child of `parent` (`None` = synthetic root).
    pub fn child(&self, parent: Option<NodeId>, name: &str, kind: NodeKind) -> Option<NodeId> {
        self.index.get(&(parent, name.to_string(), kind)).copied()
    }

    pub fn file_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.kind == NodeKind::File)
            .count()
    }

    /// Nodes in depth-first pre-order, siblings in insertion order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Resolve as much of `path` as exists in the tree, outermost node first.
    ///
    /// Intermediate segments match folders; the terminal segment prefers a
    /// file and falls back to a folder. Resolution stops at the first segment
    /// with no matching node.
    pub fn ancestor_chain(&self, path: &str) -> Vec<NodeId> {
        let entry = PathEntry::parse(path);
        let last = entry.len().saturating_sub(1);
        let mut chain = Vec::with_capacity(entry.len());
        let mut parent = None;

        for (i, segment) in entry.segments().iter().enumerate() {
            let found = if i == last {
                self.child(parent, segment, NodeKind::File)
                    .or_else(|| self.child(parent, segment, NodeKind::Folder))
            } else {
                self.child(parent, segment, NodeKind::Folder)
            };
            match found {
                Some(id) => {
                    chain.push(id);
                    parent = Some(id);
                }
                None => break,
            }
        }
        chain
    }

    /// The node whose full path is `path`, if every segment resolves.
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let entry = PathEntry::parse(path);
        if entry.is_empty() {
            return None;
        }
        let chain = self.ancestor_chain(path);
        if chain.len() == entry.len() {
            chain.last().copied()
        } else {
            None
        }
    }

    fn is_last_child(&self, id: NodeId) -> bool {
        let siblings = match self.nodes[id].parent {
            Some(parent) => self.children(parent),
            None => &self.roots,
        };
        siblings.last() == Some(&id)
    }

    /// Tree-glyph label for every node, indexed by [`NodeId`].
    ///
    /// Top-level nodes carry no glyph; folders end in `/`.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter().enumerate() {
            let mut prefix = String::new();
            if node.depth > 0 {
                // Ancestors below the top level, innermost first.
                let mut ancestors = Vec::new();
                let mut cursor = node.parent;
                while let Some(ancestor) = cursor {
                    if self.nodes[ancestor].depth == 0 {
                        break;
                    }
                    ancestors.push(ancestor);
                    cursor = self.nodes[ancestor].parent;
                }
                for &ancestor in ancestors.iter().rev() {
                    prefix.push_str(if self.is_last_child(ancestor) {
                        "   "
                    } else {
                        "│  "
                    });
                }
                prefix.push_str(if self.is_last_child(id) {
                    "└─ "
                } else {
                    "├─ "
                });
            }
            labels.push(match node.kind {
                NodeKind::Folder => format!("{}{}/", prefix, node.name),
                NodeKind::File => format!("{}{}", prefix, node.name),
            });
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tree: &FileTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| tree.node(id))
            .map(|node| node.name.clone())
            .collect()
    }

    #[test]
    fn test_build_shares_folder_prefixes() {
        // Arrange
        let paths = ["a/b/x.txt", "a/b/y.txt", "a/c/z.txt"];

        // Act
        let tree = FileTree::build(&paths, PathStyle::Posix);

        // Assert
        assert_eq!(tree.roots().len(), 1);
        let a = tree.roots()[0];
        assert_eq!(tree.node(a).map(|n| n.kind), Some(NodeKind::Folder));
        assert_eq!(names(&tree, tree.children(a)), vec!["b", "c"]);
        let b = tree.children(a)[0];
        let c = tree.children(a)[1];
        assert_eq!(tree.node(c).map(|n| n.kind), Some(NodeKind::Folder));
        assert_eq!(names(&tree, tree.children(b)), vec!["x.txt", "y.txt"]);
        assert!(
            tree.children(b)
                .iter()
                .all(|&id| tree.node(id).map(|n| n.kind) == Some(NodeKind::File))
        );
    }

    #[test]
    fn test_build_is_deterministic_and_counts_leaves() {
        // Arrange
        let paths = ["/r/z.txt", "/r/a/b.txt", "/r/a/c.txt", "/q/d.txt"];

        // Act
        let first = FileTree::build(&paths, PathStyle::Posix);
        let second = FileTree::build(&paths, PathStyle::Posix);

        // Assert
        assert_eq!(first.nodes(), second.nodes());
        assert_eq!(first.roots(), second.roots());
        assert_eq!(first.file_count(), 4);
    }

    #[test]
    fn test_children_keep_first_seen_order() {
        // Arrange
        let paths = ["/r/zeta.txt", "/r/alpha.txt", "/r/mid.txt"];

        // Act
        let tree = FileTree::build(&paths, PathStyle::Posix);

        // Assert
        let r = tree.roots()[0];
        assert_eq!(
            names(&tree, tree.children(r)),
            vec!["zeta.txt", "alpha.txt", "mid.txt"]
        );
    }

    #[test]
    fn test_build_handles_empty_separator_only_and_duplicate_paths() {
        // Arrange
        let empty: [&str; 0] = [];
        let odd = ["///", "", "/a/x.txt", "/a/x.txt"];

        // Act
        let empty_tree = FileTree::build(&empty, PathStyle::Posix);
        let odd_tree = FileTree::build(&odd, PathStyle::Posix);

        // Assert
        assert!(empty_tree.is_empty());
        assert!(empty_tree.roots().is_empty());
        assert_eq!(odd_tree.len(), 2);
        assert_eq!(odd_tree.file_count(), 1);
    }

    #[test]
    fn test_folder_and_file_with_same_name_are_distinct_siblings() {
        // Arrange
        let paths = ["/r/data", "/r/data/inner.txt"];

        // Act
        let tree = FileTree::build(&paths, PathStyle::Posix);

        // Assert
        let r = tree.roots()[0];
        assert_eq!(tree.children(r).len(), 2);
        assert!(tree.child(Some(r), "data", NodeKind::File).is_some());
        assert!(tree.child(Some(r), "data", NodeKind::Folder).is_some());
    }

    #[test]
    fn test_node_paths_follow_path_style() {
        // Arrange
        let paths = [r"C:\data\a.txt"];

        // Act
        let posix = FileTree::build(&paths, PathStyle::Posix);
        let windows = FileTree::build(&paths, PathStyle::Windows);

        // Assert
        let posix_paths: Vec<&str> = posix.nodes().iter().map(|n| n.path.as_str()).collect();
        let windows_paths: Vec<&str> = windows.nodes().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(posix_paths, vec!["/C:", "/C:/data", "/C:/data/a.txt"]);
        assert_eq!(windows_paths, vec!["C:", "C:/data", "C:/data/a.txt"]);
    }

    #[test]
    fn test_depth_counts_ancestors() {
        // Arrange
        let tree = FileTree::build(&["/r/a/b/c.txt"], PathStyle::Posix);

        // Act
        let depths: Vec<usize> = tree.nodes().iter().map(|n| n.depth).collect();

        // Assert
        assert_eq!(depths, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_insert_reports_only_created_nodes() {
        // Arrange
        let mut tree = FileTree::build(&["/r/a/x.txt"], PathStyle::Posix);

        // Act
        let created = tree.insert("/r/a/y/z.txt");

        // Assert
        assert_eq!(names(&tree, &created), vec!["y", "z.txt"]);
    }

    #[test]
    fn test_ancestor_chain_and_find_path() {
        // Arrange
        let tree = FileTree::build(&["/r/a/x.txt", "/r/b.txt"], PathStyle::Posix);

        // Act
        let chain = tree.ancestor_chain("/r/a/x.txt");
        let partial = tree.ancestor_chain("/r/a/missing.txt");

        // Assert
        assert_eq!(names(&tree, &chain), vec!["r", "a", "x.txt"]);
        assert_eq!(names(&tree, &partial), vec!["r", "a"]);
        assert_eq!(tree.find_path("/r/a/x.txt"), chain.last().copied());
        assert_eq!(tree.find_path("/r/a/missing.txt"), None);
        assert_eq!(tree.find_path(""), None);
    }

    #[test]
    fn test_depth_first_visits_children_before_siblings() {
        // Arrange
        let tree = FileTree::build(&["/r/a/x.txt", "/r/b.txt"], PathStyle::Posix);

        // Act
        let order = tree.depth_first();

        // Assert
        assert_eq!(names(&tree, &order), vec!["r", "a", "x.txt", "b.txt"]);
    }

    #[test]
    fn test_labels_draw_tree_glyphs() {
        // Arrange
        let tree = FileTree::build(
            &["/r/a/x.txt", "/r/a/y.txt", "/r/b.txt"],
            PathStyle::Posix,
        );

        // Act
        let labels = tree.labels();
        let ordered: Vec<&str> = tree
            .depth_first()
            .into_iter()
            .map(|id| labels[id].as_str())
            .collect();

        // Assert
        assert_eq!(
            ordered,
            vec!["r/", "├─ a/", "│  ├─ x.txt", "│  └─ y.txt", "└─ b.txt"]
        );
    }
}
