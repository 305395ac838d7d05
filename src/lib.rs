//! Terminal client for a vehicle-detection and plate-recognition backend.
//!
//! The [`api`] module is the heart of the crate: an authenticated request
//! gateway ([`api::ApiClient`]) that attaches the stored bearer token,
//! unwraps the backend's `detail` error envelope, and reacts to session
//! expiry by clearing the token and notifying the caller. Everything else
//! (commands, the live dashboard, the log follower, report rendering)
//! builds on top of it.

pub mod api;
pub mod cli;
pub mod config;
pub mod logs;
pub mod report;
pub mod ui;
pub mod watch;
