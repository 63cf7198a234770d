//! Client side of the daemon's two channels.
//!
//! - [`CommandClient`] sends [`Command`](crate::Command)s on the Command
//!   channel and reads their replies.
//! - [`subscribe`] follows the Broadcast channel and forwards parsed
//!   snapshots as [`WatchEvent`]s.
//!
//! Both connect with exponential backoff, so a client started alongside the
//! daemon does not fail while the listeners are still binding. The client
//! never starts a daemon itself.
//!
//! # Usage
//!
//! ```no_run
//! use varwatch::client::CommandClient;
//! use varwatch::{Command, DaemonConfig};
//!
//! # async fn example() -> Result<(), varwatch::client::ClientError> {
//! let config = DaemonConfig::default();
//! let mut client = CommandClient::connect(config.command_addr()).await?;
//! let reply = client.send(&Command::ExecuteCode("x = 1".into())).await?;
//! println!("{:?}", reply);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod subscription;

pub use connection::{connect, ClientError, CommandClient};
pub use subscription::{subscribe, WatchEvent};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
