//! Application state and main event loop for the TUI.
//!
//! [`App`] owns one [`ListView`] per panel, the latest [`Snapshot`] and the
//! kernels found on disk. Key handling mutates it through the methods
//! below. Commands to the daemon run on their own tasks and report back
//! through a channel, so the event loop keeps drawing and reading keys
//! while the kernel is busy.

use crate::client::{subscribe, ClientResult, CommandClient, WatchEvent};
use crate::kernel::{discovery, KernelInfo};
use crate::listview::{Direction, ListView, SortMode, SortOutcome};
use crate::tui::event::{handle_key_event, Action, Event, EventHandler};
use crate::tui::theme::Theme;
use crate::tui::ui::render;
use crate::{Command, Reply, Snapshot, VariableRecord};
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod update;

/// How long a status message stays on screen.
pub const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Default tick rate when none is configured.
pub const DEFAULT_TICK_RATE: Duration = Duration::from_millis(250);

/// Which panel has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Variables of the watched kernel.
    Variables,
    /// Kernels found in the runtime directory.
    Kernels,
}

/// What an open prompt collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Filter text for the focused panel.
    Filter,
    /// Search query for the focused panel.
    Search,
    /// Code to run in the kernel.
    Execute,
}

impl PromptKind {
    /// Prefix shown before the input.
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Filter => "filter: ",
            PromptKind::Search => "/",
            PromptKind::Execute => ":",
        }
    }
}

/// A single-line input at the bottom of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// What the input is for.
    pub kind: PromptKind,
    /// Text typed so far.
    pub input: String,
}

/// A transient message in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Text shown.
    pub text: String,
    /// Render in the error color.
    pub is_error: bool,
    /// When the message disappears.
    pub expires_at: Instant,
}

/// Result of a command sent from the TUI, delivered back to the event loop.
#[derive(Debug)]
pub struct CommandOutcome {
    /// The command that was sent.
    pub command: Command,
    /// The reply (`None` for commands without one) or why sending failed.
    pub result: Result<Option<Reply>, String>,
}

/// Main application state for the TUI.
#[derive(Debug)]
pub struct App {
    /// Whether the application should exit.
    pub should_quit: bool,
    /// Broadcast listener of the daemon.
    pub broadcast_addr: SocketAddr,
    /// Command listener of the daemon.
    pub command_addr: SocketAddr,
    /// Colors handed to the renderer.
    pub theme: Theme,
    /// Interval between ticks of the event loop.
    pub tick_rate: Duration,
    /// Latest snapshot received from the daemon.
    pub snapshot: Snapshot,
    /// Whether any snapshot has arrived since the last (re)connect.
    pub has_snapshot: bool,
    /// Kernels found in the runtime directory at the last reload.
    pub kernels: Vec<KernelInfo>,
    /// Navigation state of the variable panel.
    pub variables: ListView,
    /// Navigation state of the kernel panel.
    pub kernel_view: ListView,
    /// Focused panel.
    pub panel: Panel,
    /// Open prompt, if any.
    pub prompt: Option<Prompt>,
    /// Transient footer message.
    pub status_message: Option<StatusMessage>,
    /// Why the Broadcast feed dropped; `None` while connected.
    pub disconnected: Option<String>,
    /// Kernel most recently switched to from this client.
    pub current_kernel: Option<String>,
    /// Command sent to the daemon whose reply has not arrived yet.
    pub command_in_flight: Option<Command>,
}

impl App {
    /// Creates a new App with the given daemon addresses and page size.
    pub fn new(broadcast_addr: SocketAddr, command_addr: SocketAddr, page_size: usize) -> Self {
        Self {
            should_quit: false,
            broadcast_addr,
            command_addr,
            theme: Theme::default(),
            tick_rate: DEFAULT_TICK_RATE,
            snapshot: Snapshot::default(),
            has_snapshot: false,
            kernels: Vec::new(),
            variables: ListView::new(page_size),
            kernel_view: ListView::new(page_size),
            panel: Panel::Variables,
            prompt: None,
            status_message: None,
            disconnected: None,
            current_kernel: None,
            command_in_flight: None,
        }
    }

    /// The list view of the focused panel.
    pub fn active_view(&self) -> &ListView {
        match self.panel {
            Panel::Variables => &self.variables,
            Panel::Kernels => &self.kernel_view,
        }
    }

    fn active_view_mut(&mut self) -> &mut ListView {
        match self.panel {
            Panel::Variables => &mut self.variables,
            Panel::Kernels => &mut self.kernel_view,
        }
    }

    /// Key selected in the focused panel.
    pub fn selected_key(&self) -> Option<&str> {
        self.active_view().selected()
    }

    /// Record of the selected variable.
    pub fn selected_variable(&self) -> Option<&VariableRecord> {
        self.variables
            .selected()
            .and_then(|name| self.snapshot.get(name))
    }

    /// Moves the selection in the focused panel.
    pub fn navigate(&mut self, direction: Direction) {
        self.active_view_mut().navigate(direction);
    }

    /// Re-sorts the focused panel from its source.
    fn resort(&mut self, mode: SortMode) -> SortOutcome {
        match self.panel {
            Panel::Variables => self.variables.apply_sort(mode, &self.snapshot),
            Panel::Kernels => self.kernel_view.apply_sort(mode, self.kernels.as_slice()),
        }
    }

    /// Toggles the focused panel between name and type order.
    ///
    /// From a filtered view this returns to name order and drops the filter.
    pub fn toggle_sort(&mut self) {
        let next = match self.active_view().sort_mode() {
            SortMode::ByName => SortMode::ByType,
            SortMode::ByType | SortMode::Filtered => SortMode::ByName,
        };
        self.active_view_mut().set_filter(None);
        self.resort(next);
        self.set_status(format!("sorted by {}", next.label()));
    }

    /// Filters the focused panel. An empty text removes the filter.
    pub fn apply_filter(&mut self, text: &str) {
        if text.is_empty() {
            self.active_view_mut().set_filter(None);
            self.resort(SortMode::ByName);
            return;
        }
        self.active_view_mut().set_filter(Some(text.to_string()));
        if self.resort(SortMode::Filtered) == SortOutcome::FilterEmpty {
            self.set_error(format!("nothing matches '{}'", text));
        }
    }

    /// Searches the focused panel for `query`.
    pub fn search(&mut self, query: &str) {
        let view = self.active_view_mut();
        view.search(query);
        if !query.is_empty() && view.search_matches().is_empty() {
            self.set_error(format!("no match for '{}'", query));
        }
    }

    /// Jumps to the next search match in the focused panel.
    pub fn search_next(&mut self) {
        if self.active_view_mut().search_next().is_none() {
            self.set_status("no search matches".to_string());
        }
    }

    /// Esc outside a prompt: drop the search, or else return to variables.
    pub fn clear_search_or_leave_panel(&mut self) {
        if self.active_view().search_query().is_some() {
            self.active_view_mut().clear_search();
        } else if self.panel == Panel::Kernels {
            self.panel = Panel::Variables;
        }
    }

    /// Shows or hides the kernel panel, rescanning kernels when it opens.
    pub fn toggle_kernel_panel(&mut self) {
        match self.panel {
            Panel::Kernels => self.panel = Panel::Variables,
            Panel::Variables => {
                self.reload_kernels();
                self.panel = Panel::Kernels;
            }
        }
    }

    /// Rescans the Jupyter runtime directory.
    pub fn reload_kernels(&mut self) {
        let kernels = match discovery::runtime_dir() {
            Some(dir) => discovery::discover_kernels(&dir).unwrap_or_else(|e| {
                tracing::debug!(dir = %dir.display(), error = %e, "cannot read runtime dir");
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.set_kernels(kernels);
    }

    /// Replaces the kernel list, keeping the panel's sort mode.
    pub fn set_kernels(&mut self, kernels: Vec<KernelInfo>) {
        self.kernels = kernels;
        self.kernel_view.sync(self.kernels.as_slice());
    }

    /// Opens a prompt, replacing any open one.
    pub fn open_prompt(&mut self, kind: PromptKind) {
        let input = match kind {
            PromptKind::Filter => self.active_view().filter_text().unwrap_or("").to_string(),
            PromptKind::Search | PromptKind::Execute => String::new(),
        };
        self.prompt = Some(Prompt { kind, input });
    }

    /// Closes the prompt and acts on its input.
    pub fn submit_prompt(&mut self) -> Action {
        let Some(Prompt { kind, input }) = self.prompt.take() else {
            return Action::None;
        };
        match kind {
            PromptKind::Filter => {
                self.apply_filter(input.trim());
                Action::None
            }
            PromptKind::Search => {
                self.search(&input);
                Action::None
            }
            PromptKind::Execute if input.trim().is_empty() => Action::None,
            PromptKind::Execute => Action::Execute(input),
        }
    }

    /// Shows an informational footer message.
    pub fn set_status(&mut self, text: String) {
        self.status_message = Some(StatusMessage {
            text,
            is_error: false,
            expires_at: Instant::now() + STATUS_MESSAGE_TTL,
        });
    }

    /// Shows an error footer message.
    pub fn set_error(&mut self, text: String) {
        self.status_message = Some(StatusMessage {
            text,
            is_error: true,
            expires_at: Instant::now() + STATUS_MESSAGE_TTL,
        });
    }

    /// Clears the status message if its expiry time has passed.
    pub fn expire_status_message(&mut self) {
        if let Some(message) = &self.status_message {
            if Instant::now() >= message.expires_at {
                self.status_message = None;
            }
        }
    }

    /// Shows the daemon's reply to a command.
    pub fn show_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Ok(text) => {
                let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("ok");
                self.set_status(first.to_string());
            }
            Reply::Error(message) => {
                let first = message.lines().last().unwrap_or("error");
                self.set_error(first.to_string());
            }
        }
    }

    /// Marks `command` as in flight. Refuses while another one is pending.
    pub fn begin_command(&mut self, command: &Command) -> bool {
        if let Some(pending) = &self.command_in_flight {
            self.set_error(format!("busy: {pending} still running"));
            return false;
        }
        tracing::debug!(command = %command, "sending command");
        self.command_in_flight = Some(command.clone());
        self.status_message = None;
        true
    }

    /// Applies the reply to the command in flight.
    ///
    /// A successful switch makes the new kernel current and returns focus to
    /// the variable panel.
    pub fn finish_command(&mut self, outcome: CommandOutcome) {
        self.command_in_flight = None;
        let ok = match outcome.result {
            Ok(Some(reply)) => {
                let ok = matches!(reply, Reply::Ok(_));
                self.show_reply(reply);
                ok
            }
            Ok(None) => true,
            Err(message) => {
                tracing::warn!(command = %outcome.command, error = %message, "command failed");
                self.set_error(message);
                false
            }
        };
        if let (true, Command::SwitchKernel(reference)) = (ok, outcome.command) {
            self.current_kernel = Some(reference);
            self.panel = Panel::Variables;
        }
    }

    /// Sends `command` on a background task; the outcome arrives on `tx`.
    pub fn dispatch_command(&mut self, command: Command, tx: &mpsc::Sender<CommandOutcome>) {
        if !self.begin_command(&command) {
            return;
        }
        let addr = self.command_addr;
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = send_command(addr, &command).await.map_err(|e| e.to_string());
            // The receiver is gone once the TUI has quit.
            let _ = tx.send(CommandOutcome { command, result }).await;
        });
    }

    /// Runs the TUI application: sets up terminal, enters event loop, restores on exit.
    pub async fn run(&mut self) -> io::Result<()> {
        // Install panic hook that restores terminal before printing panic info
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = restore_terminal();
            original_hook(panic_info);
        }));

        setup_terminal()?;

        let result = self.event_loop().await;

        restore_terminal()?;
        result
    }

    /// Main event loop: renders UI and processes events.
    async fn event_loop(&mut self) -> io::Result<()> {
        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(self.tick_rate);
        let mut reader = EventStream::new();

        let (watch_tx, mut watch_rx) = mpsc::channel::<WatchEvent>(64);
        let (reply_tx, mut reply_rx) = mpsc::channel::<CommandOutcome>(8);
        let mut feed = self.start_feed(watch_tx.clone());
        self.reload_kernels();

        loop {
            // Drain daemon updates before rendering
            while let Ok(event) = watch_rx.try_recv() {
                self.apply_event(event);
            }
            while let Ok(outcome) = reply_rx.try_recv() {
                self.finish_command(outcome);
            }

            terminal.draw(|frame| render(frame, self))?;

            match event_handler.next(&mut reader).await? {
                Event::Key(key) => match handle_key_event(self, key) {
                    Action::Quit => {
                        self.should_quit = true;
                        feed.abort();
                        return Ok(());
                    }
                    Action::Execute(code) => {
                        self.dispatch_command(Command::ExecuteCode(code), &reply_tx);
                    }
                    Action::SwitchKernel(reference) => {
                        self.dispatch_command(Command::SwitchKernel(reference), &reply_tx);
                    }
                    Action::Copy(text) => self.copy_to_clipboard(&text),
                    Action::Reconnect => {
                        feed.abort();
                        feed = self.start_feed(watch_tx.clone());
                        self.set_status("reconnecting".to_string());
                    }
                    Action::None => {}
                },
                Event::Tick => self.expire_status_message(),
                Event::Resize(_, _) => {}
            }
        }
    }

    fn start_feed(&mut self, tx: mpsc::Sender<WatchEvent>) -> JoinHandle<()> {
        self.disconnected = None;
        self.has_snapshot = false;
        tokio::spawn(subscribe(self.broadcast_addr, tx))
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(text) {
                Ok(()) => {
                    tracing::debug!("copied {} to clipboard", text);
                    self.set_status(format!("copied {}", text));
                }
                Err(e) => {
                    tracing::warn!("failed to copy to clipboard: {}", e);
                    self.set_error(format!("copy failed: {}", e));
                }
            },
            Err(e) => {
                tracing::warn!("failed to initialize clipboard: {}", e);
                self.set_error(format!("clipboard init failed: {}", e));
            }
        }
    }
}

/// Opens a Command connection and sends one command.
async fn send_command(addr: SocketAddr, command: &Command) -> ClientResult<Option<Reply>> {
    let mut client = CommandClient::connect(addr).await?;
    client.send(command).await
}

/// Enables raw mode and switches to the alternate screen.
fn setup_terminal() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    Ok(())
}

/// Restores the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests;
