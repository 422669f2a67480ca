use super::app_logic::TuiApp;
use super::app_state::{AppMode, Pane};
use crate::correlator::TreeIndex;
use crate::session::LoadState;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

fn draw_help_block(f: &mut Frame, _app: &TuiApp, area: Rect) {
    let help_text_lines_content = vec![
        Line::from("Tab: Pane | r: Root | +: Add ext | R: Recursive | g: Get files | u: Move | q/Esc: Quit"),
        Line::from("Arrows/jk: Nav | Enter/o: Fold | *: Expand All | -: Collapse All | c: Counterpart | O: Open"),
        Line::from("/: Search text | s: Search again | Space (filters): Toggle extension"),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Reshelf"),
    );
    f.render_widget(help_paragraph, area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn draw_form_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let focused = app.pane == Pane::Filters;
    let extensions = &app.session.extensions;

    let mut ext_spans = vec![Span::raw("Extensions: ")];
    for (i, ext) in extensions.available().iter().enumerate() {
        let mut style = Style::default();
        if focused && i == app.extension_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        ext_spans.push(Span::styled(
            format!("{} {}", checkbox(extensions.is_selected(ext)), ext),
            style,
        ));
        ext_spans.push(Span::raw("  "));
    }

    let root = app.session.root_path();
    let mut lines = vec![
        Line::from(format!(
            "Root: {}",
            if root.is_empty() { "(not set)" } else { root }
        )),
        Line::from(ext_spans),
        Line::from(format!("Recursive: {}", checkbox(app.session.recursive))),
    ];
    if let Some(err) = extensions.field_error() {
        lines.push(Line::styled(err.to_string(), Style::default().fg(Color::Red)));
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(focused))
            .title("Scan"),
    );
    f.render_widget(form, area);
}

/// First visible column of a one-line input so the cursor stays inside a
/// box `inner_width` columns wide.
fn input_scroll(cursor: usize, inner_width: u16) -> u16 {
    let last_column = usize::from(inner_width.saturating_sub(1));
    u16::try_from(cursor.saturating_sub(last_column)).unwrap_or(u16::MAX)
}

fn draw_input_block(f: &mut Frame, app: &TuiApp, area: Rect, title: &str) {
    let inner_width = area.width.saturating_sub(2);
    let scroll = input_scroll(app.input_cursor_pos, inner_width);
    let input_paragraph = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((0, scroll));
    f.render_widget(input_paragraph, area);

    let column = (app.input_cursor_pos as u16).saturating_sub(scroll);
    f.set_cursor_position((area.x + 1 + column.min(inner_width), area.y + 1));
}

fn tree_title(app: &TuiApp, tree: TreeIndex) -> String {
    match app.session.tree_state(tree) {
        LoadState::Loading => format!("{} (loading...)", tree.title()),
        LoadState::Failed(message) => format!("{} ({})", tree.title(), message),
        LoadState::Idle | LoadState::Loaded => tree.title().to_string(),
    }
}

fn draw_tree_block(f: &mut Frame, app: &mut TuiApp, area: Rect, tree: TreeIndex) {
    let viewport_height = area.height.saturating_sub(2) as usize;
    app.cursors[tree.index()].viewport_height = viewport_height;
    app.ensure_selection_is_visible_in_viewport(tree);

    let cursor = app.cursors[tree.index()];
    let rows = app.visible_rows(tree);
    let window = rows
        .get(cursor.scroll_offset..(cursor.scroll_offset + viewport_height).min(rows.len()))
        .unwrap_or(&[]);

    let list_items: Vec<ListItem> = match app.session.view(tree) {
        Some(view) => window
            .iter()
            .map(|row| {
                let expansion_prefix = if row.expandable {
                    if row.expanded { "[-] " } else { "[+] " }
                } else {
                    "    "
                };
                let line = format!("{}{}", expansion_prefix, view.label(row.id));
                if row.highlighted {
                    ListItem::new(line).style(Style::default().fg(Color::Red))
                } else {
                    ListItem::new(line)
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let focused = app.pane == Pane::Tree(tree);
    let list_widget = List::new(list_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(focused))
                .title(tree_title(app, tree)),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state = ListState::default();
    if focused {
        if let Some(pos) = cursor
            .selected
            .and_then(|id| window.iter().position(|row| row.id == id))
        {
            list_state.select(Some(pos));
        }
    }
    f.render_stateful_widget(list_widget, area, &mut list_state);
}

fn draw_status_line(f: &mut Frame, app: &TuiApp, area: Rect) {
    let session = &app.session;
    let line = if app.mode == AppMode::ConfirmMove {
        let count = session.plan().map_or(0, |plan| plan.items.len());
        Line::styled(
            format!("Move {} files as shown? (y to confirm, any other key to cancel)", count),
            Style::default().fg(Color::Yellow),
        )
    } else if session.move_state().is_loading() {
        Line::from("Moving files...")
    } else if let Some(message) = session.error_message() {
        Line::styled(message.to_string(), Style::default().fg(Color::Red))
    } else if let Some(message) = session.success_message() {
        Line::styled(message.to_string(), Style::default().fg(Color::Green))
    } else if let Some(status) = session.status() {
        Line::from(status.to_string())
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(line), area);
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut TuiApp) {
    let help_lines = 3;
    let form_lines = if app.session.extensions.field_error().is_some() { 4 } else { 3 };
    let editing = match app.mode {
        AppMode::Editing(field) => Some(field),
        _ => None,
    };
    let input_height = if editing.is_some() { 3 } else { 0 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(help_lines + 2),
            Constraint::Length(form_lines + 2),
            Constraint::Length(input_height),
            Constraint::Percentage(60),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_help_block(frame, app, main_chunks[0]);
    draw_form_block(frame, app, main_chunks[1]);
    if let Some(field) = editing {
        draw_input_block(frame, app, main_chunks[2], field.title());
    }

    let tree_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[3]);
    draw_tree_block(frame, app, tree_chunks[0], TreeIndex::Source);
    draw_tree_block(frame, app, tree_chunks[1], TreeIndex::Destination);
    draw_tree_block(frame, app, main_chunks[4], TreeIndex::Search);

    draw_status_line(frame, app, main_chunks[5]);
}
