//! End-to-end tests for the watcher daemon.
//!
//! Each test binds a real [`WatcherServer`](varwatch::daemon::WatcherServer)
//! on ephemeral loopback ports with a scripted kernel and talks to it over
//! TCP, either with raw frames or through the library client.
//!
//! # Test Categories
//!
//! - `commands`: Command channel replies, ordering and mutual exclusion
//! - `broadcast`: Snapshot pushes, forced refresh and subscriber cleanup
//! - `lifecycle`: Stop and bind failures

mod broadcast;
mod commands;
mod common;
mod lifecycle;
