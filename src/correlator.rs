use crate::api::ScanPlan;
use crate::tree_builder::{NodeId, PathEntry};
use crate::tree_view::TreeView;
use std::fmt;
use thiserror::Error;

/// Which of the three panes a tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeIndex {
    Source,
    Destination,
    Search,
}

impl TreeIndex {
    pub const ALL: [TreeIndex; 3] = [TreeIndex::Source, TreeIndex::Destination, TreeIndex::Search];

    pub fn index(self) -> usize {
        match self {
            TreeIndex::Source => 0,
            TreeIndex::Destination => 1,
            TreeIndex::Search => 2,
        }
    }

    /// The tree on the other side of the mapping. Search results have none.
    pub fn sibling(self) -> Option<TreeIndex> {
        match self {
            TreeIndex::Source => Some(TreeIndex::Destination),
            TreeIndex::Destination => Some(TreeIndex::Source),
            TreeIndex::Search => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TreeIndex::Source => "Source files",
            TreeIndex::Destination => "Wanted files",
            TreeIndex::Search => "Searched files",
        }
    }
}

impl fmt::Display for TreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationEvent {
    pub tree: TreeIndex,
    pub clicked_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub target_tree: TreeIndex,
    pub target_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    #[error("{0} have no counterpart tree")]
    NotCorrelated(TreeIndex),
    #[error("no scan plan is loaded")]
    NoPlan,
    #[error("no planned move matches {0}")]
    NotFound(String),
}

/// Find the path in the sibling tree that corresponds to `event.clicked_path`.
///
/// Paths are compared segment by segment, so a trailing `/` on the root or
/// doubled separators do not prevent a match.
pub fn correlate(
    event: &CorrelationEvent,
    plan: &ScanPlan,
) -> Result<Correlation, CorrelationError> {
    let target_tree = event
        .tree
        .sibling()
        .ok_or(CorrelationError::NotCorrelated(event.tree))?;
    let clicked = PathEntry::parse(&event.clicked_path);
    let root = &plan.root_path;

    let target_path = plan
        .items
        .iter()
        .find_map(|item| {
            let (from, to) = match event.tree {
                TreeIndex::Source => (&item.source_path, &item.destination_path),
                _ => (&item.destination_path, &item.source_path),
            };
            if PathEntry::parse(&format!("{}/{}", root, from)) == clicked {
                Some(format!("{}/{}", root, to))
            } else {
                None
            }
        })
        .ok_or_else(|| CorrelationError::NotFound(event.clicked_path.clone()))?;

    Ok(Correlation {
        target_tree,
        target_path,
    })
}

/// Result of applying a correlation to a [`TreePair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jump {
    pub correlation: Correlation,
    /// Node of the target path in the target tree, when it exists there.
    pub target_node: Option<NodeId>,
}

/// Source and destination trees of one scan plan.
#[derive(Debug, Clone, Default)]
pub struct TreePair {
    pub source: TreeView,
    pub destination: TreeView,
}

impl TreePair {
    pub fn new(source: TreeView, destination: TreeView) -> Self {
        TreePair {
            source,
            destination,
        }
    }

    pub fn get(&self, tree: TreeIndex) -> Option<&TreeView> {
        match tree {
            TreeIndex::Source => Some(&self.source),
            TreeIndex::Destination => Some(&self.destination),
            TreeIndex::Search => None,
        }
    }

    pub fn get_mut(&mut self, tree: TreeIndex) -> Option<&mut TreeView> {
        match tree {
            TreeIndex::Source => Some(&mut self.source),
            TreeIndex::Destination => Some(&mut self.destination),
            TreeIndex::Search => None,
        }
    }

    /// Clear the originating tree's highlight, then highlight and open the
    /// matching path in the other tree.
    ///
    /// On a failed lookup the originating tree is still cleared and the target
    /// tree is left untouched.
    pub fn jump(
        &mut self,
        event: &CorrelationEvent,
        plan: &ScanPlan,
    ) -> Result<Jump, CorrelationError> {
        if let Some(origin) = self.get_mut(event.tree) {
            origin.clear_highlight();
        }
        let correlation = correlate(event, plan)?;
        let target_node = self
            .get_mut(correlation.target_tree)
            .and_then(|target| target.highlight_path(&correlation.target_path));
        Ok(Jump {
            correlation,
            target_node,
        })
    }
}
