//! Colors used by the renderer.
//!
//! The renderer never picks colors itself; it reads them from the [`Theme`]
//! it is handed, which is built once from `[tui.theme]`.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

use crate::config::error::ConfigError;
use crate::config::schema::ThemeConfig;

/// Resolved panel colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Headers, borders of the focused panel, selected row.
    pub accent: Color,
    /// Type tags, hints and unfocused borders.
    pub muted: Color,
    /// Errors and the disconnected banner.
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            error: Color::Red,
        }
    }
}

impl Theme {
    /// Parses each configured color name (`"cyan"`, `"darkgray"`, `"#ff8800"`, ...).
    pub fn from_config(config: &ThemeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            accent: parse_color("tui.theme.accent", &config.accent)?,
            muted: parse_color("tui.theme.muted", &config.muted)?,
            error: parse_color("tui.theme.error", &config.error)?,
        })
    }

    /// Style of the selected row.
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Style of panel titles and the header.
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Style of secondary text.
    pub fn dim(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Style of error text.
    pub fn alert(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, ConfigError> {
    Color::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("unknown color '{}'", value),
    })
}
