//! Shared test utilities for TUI testing with ratatui TestBackend.
//!
//! Provides helpers for creating test terminals, extracting buffer content,
//! asserting colors, and building app and snapshot fixtures.

use crate::tui::app::App;
use crate::{Snapshot, VariableRecord};
use ratatui::{backend::TestBackend, buffer::Buffer, style::Color, Terminal};

/// Creates a Terminal with TestBackend at the specified dimensions.
pub fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("failed to create test terminal")
}

/// Extracts all text from a specific row in the buffer as a single String.
pub fn row_text(buffer: &Buffer, row: u16) -> String {
    let area = buffer.area();
    if row >= area.height {
        return String::new();
    }
    (0..area.width)
        .map(|col| {
            buffer
                .cell((col, row))
                .map(|cell| cell.symbol())
                .unwrap_or(" ")
        })
        .collect()
}

/// Checks if a specific row contains the given substring.
pub fn row_contains(buffer: &Buffer, row: u16, text: &str) -> bool {
    row_text(buffer, row).contains(text)
}

/// Finds the first row index that contains the given text, or None if not found.
pub fn find_row_with_text(buffer: &Buffer, text: &str) -> Option<u16> {
    let area = buffer.area();
    (0..area.height).find(|&row| row_contains(buffer, row, text))
}

/// Column of the first cell of `text` in `row`. Border glyphs are multi-byte,
/// so the byte offset is converted to a cell count.
fn text_column(buffer: &Buffer, row: u16, text: &str) -> u16 {
    let row_string = row_text(buffer, row);
    let byte = row_string
        .find(text)
        .unwrap_or_else(|| panic!("text '{}' not found in row {}: '{}'", text, row, row_string));
    row_string[..byte].chars().count() as u16
}

/// Asserts that the cell at (col, row) has the specified foreground color.
pub fn assert_fg_color(buffer: &Buffer, col: u16, row: u16, color: Color) {
    let cell = buffer
        .cell((col, row))
        .unwrap_or_else(|| panic!("cell at ({}, {}) does not exist", col, row));
    assert_eq!(
        cell.fg, color,
        "expected fg color {:?} at ({}, {}), got {:?}",
        color, col, row, cell.fg
    );
}

/// Asserts that the cell at (col, row) has the specified background color.
pub fn assert_bg_color(buffer: &Buffer, col: u16, row: u16, color: Color) {
    let cell = buffer
        .cell((col, row))
        .unwrap_or_else(|| panic!("cell at ({}, {}) does not exist", col, row));
    assert_eq!(
        cell.bg, color,
        "expected bg color {:?} at ({}, {}), got {:?}",
        color, col, row, cell.bg
    );
}

/// Checks the foreground color of the first cell of `text` in `row`.
pub fn assert_text_fg_in_row(buffer: &Buffer, row: u16, text: &str, color: Color) {
    assert_fg_color(buffer, text_column(buffer, row, text), row, color);
}

/// Checks the background color of the first cell of `text` in `row`.
pub fn assert_text_bg_in_row(buffer: &Buffer, row: u16, text: &str, color: Color) {
    assert_bg_color(buffer, text_column(buffer, row, text), row, color);
}

/// Creates an App pointed at the default ports with the given page size.
pub fn make_app(page_size: usize) -> App {
    App::new(
        "127.0.0.1:47601".parse().unwrap(),
        "127.0.0.1:47602".parse().unwrap(),
        page_size,
    )
}

/// Builds a snapshot from `(name, type, preview)` triples.
pub fn make_snapshot(rows: &[(&str, &str, &str)]) -> Snapshot {
    Snapshot::from_records(
        rows.iter()
            .map(|(name, type_tag, preview)| VariableRecord::new(*name, *type_tag, *preview)),
    )
}

/// Renders the full screen to a buffer and returns it for inspection.
pub fn render_to_buffer(app: &App, width: u16, height: u16) -> Buffer {
    let mut terminal = test_terminal(width, height);
    terminal
        .draw(|frame| {
            crate::tui::ui::render(frame, app);
        })
        .expect("draw failed");
    terminal.backend().buffer().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_terminal_creates_terminal() {
        let terminal = test_terminal(80, 24);
        let size = terminal.size().expect("should have size");
        assert_eq!(size.width, 80);
        assert_eq!(size.height, 24);
    }

    #[test]
    fn test_row_text_extracts_row_content() {
        let mut terminal = test_terminal(20, 5);
        terminal
            .draw(|frame| {
                let area = frame.area();
                let para = ratatui::widgets::Paragraph::new("Hello World");
                frame.render_widget(para, area);
            })
            .expect("draw failed");
        let buffer = terminal.backend().buffer();
        assert!(row_text(buffer, 0).contains("Hello World"));
        assert!(row_text(buffer, 10).is_empty());
    }

    #[test]
    fn test_text_column_counts_cells_not_bytes() {
        let mut terminal = test_terminal(20, 3);
        terminal
            .draw(|frame| {
                let block = ratatui::widgets::Block::default()
                    .borders(ratatui::widgets::Borders::ALL);
                let para = ratatui::widgets::Paragraph::new("abc").block(block);
                frame.render_widget(para, frame.area());
            })
            .expect("draw failed");
        let buffer = terminal.backend().buffer();
        assert_eq!(text_column(buffer, 1, "abc"), 1);
    }

    #[test]
    fn test_make_snapshot_keeps_fields() {
        let snapshot = make_snapshot(&[("x", "int", "1")]);
        let record = snapshot.get("x").unwrap();
        assert_eq!(record.type_tag, "int");
        assert_eq!(record.value_preview, "1");
    }
}
