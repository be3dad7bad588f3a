#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

//! # mockctl
//!
//! Client-side control surface for a remote mock/tunnel server. The server
//! owns the state of record (mock data files, TCP tunnels and their live
//! connections, the log feed); this crate keeps a local view of each remote
//! collection in sync with it and routes every user action through a single
//! HTTP request.
//!
//! ## Architecture
//!
//! ```text
//! lib.rs        — module root
//! main.rs       — entry point, tracing setup, command dispatch
//! cli.rs        — clap argument definitions
//! config.rs     — TOML file / env-var / CLI configuration
//! console.rs    — stdin reader thread + Ctrl-C for the shell
//! error.rs      — ControlError, the uniform failure surface
//! transport.rs  — Transport trait + reqwest/tungstenite implementation
//! model.rs      — wire types (listings, tunnels, connections, actions)
//! guard.rs      — SessionGuard: unsaved-edit protection
//! editor.rs     — Editor contract, TextBuffer, extension → mode lookup
//! files.rs      — FileBrowser controller
//! tunnels.rs    — TunnelController
//! logs.rs       — LogStreamConsumer and the append-only LogPanel
//! view.rs       — pure render(state) -> view-model functions
//! shell.rs      — interactive line-oriented front-end
//! ```

pub mod cli;
pub mod config;
pub mod console;
pub mod editor;
pub mod error;
pub mod files;
pub mod guard;
pub mod logs;
pub mod model;
pub mod shell;
pub mod transport;
pub mod tunnels;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::ControlError;
pub use files::FileBrowser;
pub use guard::SessionGuard;
pub use logs::LogStreamConsumer;
pub use transport::{HttpTransport, Transport, TransportError};
pub use tunnels::TunnelController;
