//! Terminal client command.

use std::net::SocketAddr;
use std::process::ExitCode;

use varwatch::config::loader::parse_duration;
use varwatch::config::schema::Config;
use varwatch::config::xdg;
use varwatch::daemon::logging;
use varwatch::tui::app::App;
use varwatch::tui::theme::Theme;
use varwatch::BIND_HOST;

/// Builds the App from `[daemon]` ports and `[tui]` settings.
pub(crate) fn build_app(config: &Config) -> Result<App, varwatch::config::error::ConfigError> {
    let mut app = App::new(
        SocketAddr::from((BIND_HOST, config.daemon.broadcast_port)),
        SocketAddr::from((BIND_HOST, config.daemon.command_port)),
        config.tui.page_size,
    );
    app.theme = Theme::from_config(&config.tui.theme)?;
    app.tick_rate = parse_duration("tui.tick_rate", &config.tui.tick_rate)?;
    Ok(app)
}

/// Runs the terminal client until the user quits.
///
/// Logs go to `daemon.log_file` when one is configured; otherwise logging
/// stays off so it cannot draw over the screen.
pub(crate) fn run_tui_command(config: &Config) -> ExitCode {
    let log_file = config.daemon.log_file.trim();
    if !log_file.is_empty() {
        let path = xdg::expand_tilde(log_file);
        if let Err(e) = logging::init(config.daemon.log_level, Some(&path)) {
            eprintln!("Warning: logging disabled: {}", e);
        }
    }

    let mut app = match build_app(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime for TUI: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = runtime.block_on(app.run()) {
        eprintln!("TUI error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_app_uses_config() {
        let mut config = Config::default();
        config.daemon.broadcast_port = 50001;
        config.daemon.command_port = 50002;
        config.tui.page_size = 7;
        config.tui.tick_rate = "1s".to_string();
        config.tui.theme.accent = "green".to_string();

        let app = build_app(&config).unwrap();
        assert_eq!(app.broadcast_addr.port(), 50001);
        assert_eq!(app.command_addr.port(), 50002);
        assert_eq!(app.variables.page_size(), 7);
        assert_eq!(app.tick_rate, Duration::from_secs(1));
        assert_eq!(app.theme.accent, ratatui::style::Color::Green);
    }

    #[test]
    fn test_build_app_rejects_bad_color() {
        let mut config = Config::default();
        config.tui.theme.muted = "nope".to_string();
        assert!(build_app(&config).is_err());
    }
}
