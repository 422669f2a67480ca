use crate::tree_builder::{FileNode, FileTree, NodeId, NodeKind, PathEntry, PathStyle};
use std::collections::HashSet;

/// Render-ready projection of one tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
    pub path: String,
    pub highlighted: bool,
}

/// A [`FileTree`] bound to per-node expansion and highlight state.
///
/// Both states are keyed by [`NodeId`] and reset whenever the tree is rebuilt.
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    tree: FileTree,
    labels: Vec<String>,
    root_path: String,
    expanded: HashSet<NodeId>,
    highlighted: HashSet<NodeId>,
}

impl TreeView {
    pub fn new<S: AsRef<str>>(paths: &[S], root_path: &str, style: PathStyle) -> Self {
        let tree = FileTree::build(paths, style);
        let mut view = TreeView {
            labels: tree.labels(),
            tree,
            root_path: root_path.to_string(),
            ..TreeView::default()
        };
        view.expand_root_levels();
        view
    }

    /// Replace the tree and start over with the initial expansion policy.
    pub fn rebuild<S: AsRef<str>>(&mut self, paths: &[S], root_path: &str) {
        self.tree = FileTree::new(self.tree.style());
        self.root_path = root_path.to_string();
        self.expanded.clear();
        self.highlighted.clear();
        self.append(paths);
        self.expand_root_levels();
    }

    /// Insert more paths while keeping expansion and highlight. A created node
    /// takes its parent's highlight as it stands at insertion time.
    pub fn append<S: AsRef<str>>(&mut self, paths: &[S]) {
        for path in paths {
            for id in self.tree.insert(path.as_ref()) {
                let inherited = self
                    .tree
                    .node(id)
                    .and_then(|node| node.parent)
                    .is_some_and(|parent| self.highlighted.contains(&parent));
                if inherited {
                    self.highlighted.insert(id);
                }
            }
        }
        self.labels = self.tree.labels();
    }

    // Folders shallower than the root path's segment count start open so the
    // root itself is visible without interaction.
    fn expand_root_levels(&mut self) {
        let levels = PathEntry::parse(&self.root_path).len();
        let open: Vec<NodeId> = self
            .tree
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.depth < levels && node.is_folder())
            .map(|(id, _)| id)
            .collect();
        self.expanded.extend(open);
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn label(&self, id: NodeId) -> &str {
        self.labels.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn flat_node(&self, id: NodeId) -> Option<FlatNode> {
        let node = self.tree.node(id)?;
        Some(FlatNode {
            id,
            name: node.name.clone(),
            kind: node.kind,
            depth: node.depth,
            expandable: node.children.is_some(),
            expanded: self.is_expanded(id),
            path: node.path.clone(),
            highlighted: self.is_highlighted(id),
        })
    }

    /// Every node, depth-first, regardless of expansion.
    pub fn flatten(&self) -> Vec<FlatNode> {
        self.tree
            .depth_first()
            .into_iter()
            .filter_map(|id| self.flat_node(id))
            .collect()
    }

    /// Nodes whose ancestors are all expanded, depth-first.
    pub fn visible(&self) -> Vec<FlatNode> {
        let mut rows = Vec::new();
        let mut stack: Vec<NodeId> = self.tree.roots().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(row) = self.flat_node(id) {
                rows.push(row);
            }
            if self.is_expanded(id) {
                stack.extend(self.tree.children(id).iter().rev().copied());
            }
        }
        rows
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expand(&mut self, id: NodeId) {
        if self.tree.node(id).is_some_and(FileNode::is_folder) {
            self.expanded.insert(id);
        }
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.remove(&id);
    }

    /// Flip expansion of a folder. Returns the new state; files stay closed.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.is_expanded(id) {
            self.collapse(id);
            false
        } else {
            self.expand(id);
            self.is_expanded(id)
        }
    }

    pub fn expand_all(&mut self) {
        let folders: Vec<NodeId> = self
            .tree
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_folder())
            .map(|(id, _)| id)
            .collect();
        self.expanded.extend(folders);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.highlighted.contains(&id)
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted.clear();
    }

    /// Highlight and open the ancestor chain of `path`, dropping any previous
    /// highlight. Returns the terminal node when the whole path resolves.
    pub fn highlight_path(&mut self, path: &str) -> Option<NodeId> {
        self.highlighted.clear();
        let chain = self.tree.ancestor_chain(path);
        for &id in &chain {
            self.highlighted.insert(id);
            self.expand(id);
        }
        self.tree.find_path(path)
    }
}
