//! Terminal client for varwatch.
//!
//! Provides a terminal user interface built on ratatui and crossterm that
//! follows the daemon's Broadcast channel and browses the latest snapshot.

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_utils;
