//! Command channel payload types.
//!
//! Commands travel as single frames whose payload starts with a tag:
//!
//! | Tag        | Command                     |
//! |------------|-----------------------------|
//! | `<code>`   | execute the rest as code    |
//! | `<cf>`     | switch to the named kernel  |
//! | `<_stop>`  | stop the daemon             |
//! | `<TEST>`   | liveness probe              |
//!
//! Replies (where a command has one) are frames tagged `<ok>` or `<error>`.

use std::fmt;

/// Tag prefix for [`Command::ExecuteCode`].
pub const TAG_CODE: &str = "<code>";
/// Tag prefix for [`Command::SwitchKernel`].
pub const TAG_SWITCH: &str = "<cf>";
/// Payload of [`Command::Stop`].
pub const TAG_STOP: &str = "<_stop>";
/// Payload of [`Command::Ping`].
pub const TAG_PING: &str = "<TEST>";
/// Tag prefix of a successful reply.
pub const TAG_OK: &str = "<ok>";
/// Tag prefix of a failed reply.
pub const TAG_ERROR: &str = "<error>";

/// A single request sent by a client on the Command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a snippet in the kernel and reply with its output.
    ExecuteCode(String),
    /// Rebind the daemon to another kernel.
    SwitchKernel(String),
    /// Stop both daemon loops.
    Stop,
    /// Liveness probe; no reply.
    Ping,
}

/// Error returned when a payload carries no known tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command payload: {preview}")]
pub struct UnknownCommand {
    /// First characters of the offending payload, for logging.
    pub preview: String,
}

impl Command {
    /// Parses a frame payload into a command.
    pub fn parse(payload: &str) -> Result<Self, UnknownCommand> {
        if let Some(code) = payload.strip_prefix(TAG_CODE) {
            return Ok(Command::ExecuteCode(code.to_string()));
        }
        if let Some(reference) = payload.strip_prefix(TAG_SWITCH) {
            return Ok(Command::SwitchKernel(reference.trim().to_string()));
        }
        match payload {
            TAG_STOP => Ok(Command::Stop),
            TAG_PING => Ok(Command::Ping),
            _ => Err(UnknownCommand {
                preview: payload.chars().take(32).collect(),
            }),
        }
    }

    /// Serializes the command into its frame payload.
    pub fn to_payload(&self) -> String {
        match self {
            Command::ExecuteCode(code) => format!("{TAG_CODE}{code}"),
            Command::SwitchKernel(reference) => format!("{TAG_SWITCH}{reference}"),
            Command::Stop => TAG_STOP.to_string(),
            Command::Ping => TAG_PING.to_string(),
        }
    }

    /// Whether the daemon answers this command with a reply frame.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Command::Ping)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ExecuteCode(code) => write!(f, "execute ({} bytes)", code.len()),
            Command::SwitchKernel(reference) => write!(f, "switch to {reference}"),
            Command::Stop => write!(f, "stop"),
            Command::Ping => write!(f, "ping"),
        }
    }
}

/// Reply sent back on the Command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The command succeeded; carries kernel output or an acknowledgement.
    Ok(String),
    /// The command failed; carries a human-readable message.
    Error(String),
}

impl Reply {
    /// Serializes to a tagged frame payload.
    pub fn to_payload(&self) -> String {
        match self {
            Reply::Ok(text) => format!("{TAG_OK}{text}"),
            Reply::Error(message) => format!("{TAG_ERROR}{message}"),
        }
    }

    /// Parses a reply payload. Untagged payloads are treated as output.
    pub fn parse(payload: &str) -> Self {
        if let Some(message) = payload.strip_prefix(TAG_ERROR) {
            Reply::Error(message.to_string())
        } else {
            Reply::Ok(payload.strip_prefix(TAG_OK).unwrap_or(payload).to_string())
        }
    }
}
