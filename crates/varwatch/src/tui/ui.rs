//! Rendering for the TUI.
//!
//! [`render`] composes a header line, the focused panel and a footer. All
//! colors come from `app.theme`.

use crate::listview::ListView;
use crate::tui::app::{App, Panel};
use crate::tui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Header text displayed at the top of the screen.
const HEADER_TEXT: &str = "varwatch";

/// Footer text showing available keybindings.
const FOOTER_TEXT: &str =
    "[hjkl] Move  [t] Sort  [f] Filter  [/] Search  [n] Next  [:] Exec  [K] Kernels  [y] Copy  [r] Reconnect  [q] Quit";

/// Widest name column before names are cut.
const MAX_NAME_WIDTH: usize = 24;

/// Width of the type column.
const TYPE_WIDTH: usize = 12;

/// Renders the full screen.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(3),    // panel
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.panel {
        Panel::Variables => render_variables(frame, app, chunks[1]),
        Panel::Kernels => render_kernels(frame, app, chunks[1]),
    }
    render_footer(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut spans = vec![Span::styled(HEADER_TEXT, theme.title())];
    if let Some(kernel) = &app.current_kernel {
        spans.push(Span::styled(format!("  {}", kernel), theme.dim()));
    }
    let state = match &app.disconnected {
        Some(_) => Span::styled("  disconnected", theme.alert()),
        None if app.has_snapshot => Span::styled(format!("  {}", app.broadcast_addr), theme.dim()),
        None => Span::styled("  waiting for snapshot", theme.dim()),
    };
    spans.push(state);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_variables(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.variables;
    let name_width = view
        .page_keys()
        .iter()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(4, MAX_NAME_WIDTH);

    let lines = page_lines(view, &app.theme, |name| {
        let (type_tag, preview) = app
            .snapshot
            .get(name)
            .map(|r| (r.type_tag.as_str(), r.value_preview.as_str()))
            .unwrap_or(("", ""));
        format!(
            "{:<nw$} {:<tw$} {}",
            truncate(name, name_width),
            truncate(type_tag, TYPE_WIDTH),
            preview,
            nw = name_width,
            tw = TYPE_WIDTH,
        )
    });

    let empty_hint = if app.has_snapshot {
        "no variables"
    } else {
        "no snapshot yet"
    };
    render_panel(frame, app, area, "Variables", view, lines, empty_hint);
}

fn render_kernels(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.kernel_view;
    let lines = page_lines(view, &app.theme, |reference| {
        let name = app
            .kernels
            .iter()
            .find(|k| k.reference == reference)
            .map(|k| k.kernel_name.as_str())
            .unwrap_or("");
        let marker = if app.current_kernel.as_deref() == Some(reference) {
            "*"
        } else {
            " "
        };
        format!("{} {} ({})", marker, reference, name)
    });
    render_panel(frame, app, area, "Kernels", view, lines, "no kernels found");
}

/// Builds one line per key on the current page, highlighting the selection.
fn page_lines<'a>(
    view: &ListView,
    theme: &Theme,
    mut describe: impl FnMut(&str) -> String,
) -> Vec<Line<'a>> {
    let start = view.page_start();
    view.page_keys()
        .iter()
        .enumerate()
        .map(|(offset, key)| {
            let style = if start + offset == view.position() {
                theme.selected()
            } else {
                Style::default()
            };
            Line::from(Span::styled(describe(key), style))
        })
        .collect()
}

fn render_panel(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    name: &str,
    view: &ListView,
    lines: Vec<Line<'_>>,
    empty_hint: &str,
) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(Span::styled(panel_title(name, view), theme.title()));

    let body = if lines.is_empty() {
        vec![Line::from(Span::styled(empty_hint.to_string(), theme.dim()))]
    } else {
        lines
    };
    frame.render_widget(Paragraph::new(body).block(block), area);
}

/// Title like `Variables  2/5  sort:type  filter:df  /x 1/3`.
pub fn panel_title(name: &str, view: &ListView) -> String {
    let mut title = format!(
        " {}  {}/{}  sort:{}",
        name,
        view.page(),
        view.page_count(),
        view.sort_mode().label()
    );
    if let Some(filter) = view.filter_text() {
        title.push_str(&format!("  filter:{}", filter));
    }
    if let Some(query) = view.search_query() {
        let total = view.search_matches().len();
        let current = if total == 0 { 0 } else { view.search_cursor() + 1 };
        title.push_str(&format!("  /{} {}/{}", query, current, total));
    }
    title.push(' ');
    title
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let line = if let Some(prompt) = &app.prompt {
        Line::from(vec![
            Span::styled(prompt.kind.label(), theme.title()),
            Span::raw(prompt.input.clone()),
            Span::styled("_", theme.dim()),
        ])
    } else if let Some(message) = &app.status_message {
        let style = if message.is_error {
            theme.alert()
        } else {
            Style::default().fg(theme.accent)
        };
        Line::from(Span::styled(message.text.clone(), style))
    } else if let Some(command) = &app.command_in_flight {
        Line::from(Span::styled(format!("running {command} ..."), theme.dim()))
    } else if let Some(reason) = &app.disconnected {
        Line::from(Span::styled(
            format!("disconnected: {}  [r] reconnect", reason),
            theme.alert(),
        ))
    } else {
        Line::from(Span::styled(FOOTER_TEXT, theme.dim()))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
