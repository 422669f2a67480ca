use super::app_state::{AppMode, InputField, Pane, TreeCursor};
use crate::correlator::TreeIndex;
use crate::session::Session;
use crate::tree_builder::NodeKind;
use crate::tree_view::{FlatNode, TreeView};
use crossterm::event::{KeyCode, KeyEvent};

pub struct TuiApp {
    pub(super) session: Session,
    pub(super) pane: Pane,
    pub(super) mode: AppMode,
    pub(super) input: String,
    pub(super) input_cursor_pos: usize,
    pub(super) extension_cursor: usize,
    pub(super) cursors: [TreeCursor; 3],
    pub(super) quit: bool,
}

impl TuiApp {
    pub fn new(session: Session) -> Self {
        TuiApp {
            session,
            pane: Pane::Filters,
            mode: AppMode::Normal,
            input: String::new(),
            input_cursor_pos: 0,
            extension_cursor: 0,
            cursors: [TreeCursor::default(); 3],
            quit: false,
        }
    }

    /// Apply finished requests and keep every cursor on a visible node.
    pub(super) fn tick(&mut self) {
        if self.session.poll() {
            for tree in TreeIndex::ALL {
                self.ensure_selection_is_visible(tree);
            }
        }
    }

    pub(super) fn visible_rows(&self, tree: TreeIndex) -> Vec<FlatNode> {
        self.session
            .view(tree)
            .map(TreeView::visible)
            .unwrap_or_default()
    }

    pub(super) fn selected_row(&self, tree: TreeIndex) -> Option<FlatNode> {
        let selected = self.cursors[tree.index()].selected?;
        self.visible_rows(tree)
            .into_iter()
            .find(|row| row.id == selected)
    }

    fn reset_cursor(&mut self, tree: TreeIndex) {
        let cursor = &mut self.cursors[tree.index()];
        cursor.selected = None;
        cursor.scroll_offset = 0;
    }

    pub(super) fn move_selection_in_visible_list(&mut self, tree: TreeIndex, delta: i32) {
        let rows = self.visible_rows(tree);
        if rows.is_empty() {
            return;
        }
        let cursor = &mut self.cursors[tree.index()];
        let current_pos = cursor
            .selected
            .and_then(|id| rows.iter().position(|row| row.id == id));
        let new_pos = match current_pos {
            Some(pos) => (pos as i32 + delta).rem_euclid(rows.len() as i32) as usize,
            None => {
                if delta > 0 {
                    0
                } else {
                    rows.len() - 1
                }
            }
        };
        cursor.selected = Some(rows[new_pos].id);
        self.ensure_selection_is_visible_in_viewport(tree);
    }

    /// Move a hidden selection up to its nearest visible ancestor, or to the
    /// first row when there is none.
    pub(super) fn ensure_selection_is_visible(&mut self, tree: TreeIndex) {
        let Some(view) = self.session.view(tree) else {
            self.reset_cursor(tree);
            return;
        };
        let rows = view.visible();
        let cursor = &mut self.cursors[tree.index()];

        let mut candidate = cursor.selected.filter(|&id| id < view.tree().len());
        while let Some(id) = candidate {
            if rows.iter().any(|row| row.id == id) {
                break;
            }
            candidate = view.tree().node(id).and_then(|node| node.parent);
        }
        cursor.selected = candidate.or_else(|| rows.first().map(|row| row.id));
        self.ensure_selection_is_visible_in_viewport(tree);
    }

    pub(super) fn ensure_selection_is_visible_in_viewport(&mut self, tree: TreeIndex) {
        let rows = self.visible_rows(tree);
        let cursor = &mut self.cursors[tree.index()];
        if rows.is_empty() {
            cursor.scroll_offset = 0;
            return;
        }
        let list_height = cursor.viewport_height;
        if list_height == 0 {
            return;
        }

        if let Some(pos) = cursor
            .selected
            .and_then(|id| rows.iter().position(|row| row.id == id))
        {
            if pos < cursor.scroll_offset {
                cursor.scroll_offset = pos;
            } else if pos >= cursor.scroll_offset + list_height {
                cursor.scroll_offset = pos + 1 - list_height;
            }
        }

        if rows.len() <= list_height {
            cursor.scroll_offset = 0;
        } else {
            cursor.scroll_offset = cursor.scroll_offset.min(rows.len() - list_height);
        }
    }

    pub(super) fn toggle_expansion_and_adjust_selection(&mut self, tree: TreeIndex) {
        let Some(id) = self.cursors[tree.index()].selected else {
            return;
        };
        if let Some(view) = self.session.view_mut(tree) {
            view.toggle(id);
        }
        self.ensure_selection_is_visible(tree);
    }

    pub(super) fn expand_all_directories(&mut self, tree: TreeIndex) {
        if let Some(view) = self.session.view_mut(tree) {
            view.expand_all();
        }
        self.ensure_selection_is_visible(tree);
    }

    pub(super) fn collapse_all_directories(&mut self, tree: TreeIndex) {
        if let Some(view) = self.session.view_mut(tree) {
            view.collapse_all();
        }
        self.ensure_selection_is_visible(tree);
    }

    /// Highlight the selected node's counterpart in the other tree and move
    /// that tree's cursor onto it.
    pub(super) fn jump_to_counterpart(&mut self, tree: TreeIndex) {
        let Some(row) = self.selected_row(tree) else {
            return;
        };
        if let Ok(jump) = self.session.jump(tree, &row.path) {
            let target = jump.correlation.target_tree;
            if let Some(node) = jump.target_node {
                self.cursors[target.index()].selected = Some(node);
            }
            self.ensure_selection_is_visible(target);
        }
    }

    pub(super) fn open_selected_file(&mut self, tree: TreeIndex) {
        let Some(row) = self.selected_row(tree) else {
            return;
        };
        if row.kind == NodeKind::File {
            self.session.open_file(&row.path);
            self.session.set_status(Some(format!("Opening {}", row.path)));
        } else {
            self.session
                .set_status(Some("Only files can be opened".to_string()));
        }
    }

    pub(super) fn request_scan(&mut self) {
        if self.session.root_path().is_empty() {
            self.session
                .set_status(Some("Set a root path first (r)".to_string()));
            return;
        }
        self.session.set_status(None);
        self.reset_cursor(TreeIndex::Source);
        self.reset_cursor(TreeIndex::Destination);
        self.session.request_scan();
    }

    pub(super) fn request_search(&mut self) {
        self.reset_cursor(TreeIndex::Search);
        self.session.request_search();
    }

    pub(super) fn request_move_confirmation(&mut self) {
        if self.session.can_confirm_move() {
            self.mode = AppMode::ConfirmMove;
        } else {
            self.session
                .set_status(Some("Nothing to move yet: get files first (g)".to_string()));
        }
    }

    fn begin_edit(&mut self, field: InputField) {
        self.input = match field {
            InputField::RootPath => self.session.root_path().to_string(),
            InputField::SearchQuery => self.session.search_query().to_string(),
            InputField::NewExtension => String::new(),
        };
        self.input_cursor_pos = self.input.chars().count();
        self.mode = AppMode::Editing(field);
    }

    fn input_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.input_cursor_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    // Root path edits apply immediately, so separators are normalized as typed.
    fn after_input_change(&mut self, field: InputField) {
        if field == InputField::RootPath {
            self.session.set_root_path(&self.input);
            self.input = self.session.root_path().to_string();
            self.input_cursor_pos = self.input_cursor_pos.min(self.input.chars().count());
        }
    }

    fn commit_edit(&mut self, field: InputField) {
        match field {
            InputField::RootPath => self.mode = AppMode::Normal,
            InputField::SearchQuery => {
                self.session.set_search_query(&self.input);
                self.mode = AppMode::Normal;
                self.request_search();
            }
            InputField::NewExtension => {
                if self.session.extensions.add(&self.input).is_ok() {
                    let added = self.input.trim();
                    self.extension_cursor = self
                        .session
                        .extensions
                        .available()
                        .iter()
                        .position(|ext| ext == added)
                        .unwrap_or(0);
                    self.mode = AppMode::Normal;
                }
            }
        }
    }

    fn cancel_edit(&mut self, field: InputField) {
        if field == InputField::NewExtension {
            self.session.extensions.clear_field_error();
        }
        self.mode = AppMode::Normal;
    }

    pub(super) fn handle_editing_mode_input(&mut self, field: InputField, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => self.commit_edit(field),
            KeyCode::Esc => self.cancel_edit(field),
            KeyCode::Char(c) => {
                let at = self.input_byte_index();
                self.input.insert(at, c);
                self.input_cursor_pos += 1;
                self.after_input_change(field);
            }
            KeyCode::Backspace => {
                if self.input_cursor_pos > 0 {
                    self.input_cursor_pos -= 1;
                    let at = self.input_byte_index();
                    self.input.remove(at);
                    self.after_input_change(field);
                }
            }
            KeyCode::Left => {
                self.input_cursor_pos = self.input_cursor_pos.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.input_cursor_pos < self.input.chars().count() {
                    self.input_cursor_pos += 1;
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_confirm_mode_input(&mut self, key_event: KeyEvent) {
        if key_event.code == KeyCode::Char('y') {
            self.session.confirm_move();
        }
        self.mode = AppMode::Normal;
    }

    fn handle_filters_input(&mut self, key_event: KeyEvent) {
        let count = self.session.extensions.available().len();
        if count == 0 {
            return;
        }
        match key_event.code {
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Up | KeyCode::Char('k') => {
                self.extension_cursor = (self.extension_cursor + count - 1) % count;
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Down | KeyCode::Char('j') => {
                self.extension_cursor = (self.extension_cursor + 1) % count;
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(ext) = self
                    .session
                    .extensions
                    .available()
                    .get(self.extension_cursor)
                    .cloned()
                {
                    self.session.extensions.toggle(&ext);
                }
            }
            _ => {}
        }
    }

    fn handle_tree_input(&mut self, tree: TreeIndex, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_in_visible_list(tree, 1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_in_visible_list(tree, -1),
            KeyCode::Enter | KeyCode::Char('o') | KeyCode::Char(' ') => {
                self.toggle_expansion_and_adjust_selection(tree)
            }
            KeyCode::Char('*') => self.expand_all_directories(tree),
            KeyCode::Char('-') => self.collapse_all_directories(tree),
            KeyCode::Char('c') => self.jump_to_counterpart(tree),
            KeyCode::Char('O') => self.open_selected_file(tree),
            _ => {}
        }
    }

    pub(super) fn handle_normal_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.pane = self.pane.cycle(1),
            KeyCode::BackTab => self.pane = self.pane.cycle(-1),
            KeyCode::Char('r') => self.begin_edit(InputField::RootPath),
            KeyCode::Char('+') => self.begin_edit(InputField::NewExtension),
            KeyCode::Char('/') => self.begin_edit(InputField::SearchQuery),
            KeyCode::Char('R') => self.session.recursive = !self.session.recursive,
            KeyCode::Char('g') => self.request_scan(),
            KeyCode::Char('s') => self.request_search(),
            KeyCode::Char('u') => self.request_move_confirmation(),
            _ => match self.pane {
                Pane::Filters => self.handle_filters_input(key_event),
                Pane::Tree(tree) => self.handle_tree_input(tree, key_event),
            },
        }
    }

    pub(super) fn handle_key(&mut self, key_event: KeyEvent) {
        match self.mode {
            AppMode::Normal => self.handle_normal_mode_input(key_event),
            AppMode::Editing(field) => self.handle_editing_mode_input(field, key_event),
            AppMode::ConfirmMove => self.handle_confirm_mode_input(key_event),
        }
    }
}
