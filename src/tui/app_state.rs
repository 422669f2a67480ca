use crate::correlator::TreeIndex;
use crate::tree_builder::NodeId;

/// The focused area of the screen.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum Pane {
    Filters,
    Tree(TreeIndex),
}

impl Pane {
    const ORDER: [Pane; 4] = [
        Pane::Filters,
        Pane::Tree(TreeIndex::Source),
        Pane::Tree(TreeIndex::Destination),
        Pane::Tree(TreeIndex::Search),
    ];

    pub(super) fn cycle(self, delta: i32) -> Pane {
        let len = Self::ORDER.len() as i32;
        let pos = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0) as i32;
        Self::ORDER[(pos + delta).rem_euclid(len) as usize]
    }
}

/// Single-line text inputs.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum InputField {
    RootPath,
    NewExtension,
    SearchQuery,
}

impl InputField {
    pub(super) fn title(self) -> &'static str {
        match self {
            InputField::RootPath => "Root path (Enter to apply, Esc to cancel)",
            InputField::NewExtension => "New extension, e.g. .md (Enter to add, Esc to cancel)",
            InputField::SearchQuery => "Search text (Enter to search, Esc to cancel)",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum AppMode {
    Normal,
    Editing(InputField),
    ConfirmMove,
}

/// Selection and scrolling of one tree pane.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct TreeCursor {
    pub(super) selected: Option<NodeId>,
    pub(super) scroll_offset: usize,
    pub(super) viewport_height: usize,
}
