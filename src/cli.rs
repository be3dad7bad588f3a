//! Command-line interface.
//!
//! One-shot subcommands drive a single controller operation and print the
//! rendered view to stdout; `shell` (the default) runs the interactive
//! front-end in [`crate::shell`].

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;
use crate::editor::TextBuffer;
use crate::error::ControlError;
use crate::files::FileBrowser;
use crate::guard::{ConsolePrompt, SessionGuard};
use crate::logs::{LogPanel, LogStreamConsumer, LogUpdate};
use crate::model::{ConnectionAction, CreateKind, Entry, EntryType, TunnelAction};
use crate::transport::Transport;
use crate::tunnels::TunnelController;
use crate::view;

/// Control a remote mock/tunnel server: edit mock files, manage tunnels,
/// follow the server log.
#[derive(Parser, Debug)]
#[command(name = "mockctl", version)]
pub struct Cli {
    /// Path to TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL, e.g. http://127.0.0.1:80
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Server password (HTTP Basic)
    #[arg(long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mock data files
    #[command(subcommand)]
    File(FileCommand),
    /// Tunnels and their connections
    #[command(subcommand)]
    Tunnel(TunnelCommand),
    /// Follow the server log until the connection drops
    Logs,
    /// Interactive session (default when no subcommand given)
    Shell,
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// List a directory
    Ls { path: Option<String> },
    /// Print a file
    Cat { path: String },
    /// Replace a file's content with stdin
    Save { path: String },
    /// Ask the server to reload a config/processor file
    Reload { path: String },
    /// Create a file or folder
    New {
        kind: CreateKind,
        name: String,
        /// Parent directory (default: server working directory)
        #[arg(long = "in")]
        dir: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TunnelCommand {
    /// List tunnels
    Ls,
    /// Start a tunnel
    Start { port: u16 },
    /// Stop a tunnel
    Stop { port: u16 },
    /// List a tunnel's live connections
    Conns { port: u16 },
    /// Close a connection
    Close { port: u16, conn_id: String },
    /// Reset (RST) a connection
    Reset { port: u16, conn_id: String },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            url: self.url.clone(),
            password: self.password.clone(),
        }
    }
}

/// A file entry for a path that is not in any cached listing.
fn file_entry(path: &str) -> Entry {
    Entry {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        entry_type: EntryType::File,
    }
}

pub async fn run_file<T: Transport>(transport: T, cmd: FileCommand) -> Result<(), ControlError> {
    let mut browser = FileBrowser::new(
        transport,
        SessionGuard::new(ConsolePrompt),
        TextBuffer::new(),
    );
    match cmd {
        FileCommand::Ls { path } => {
            browser.list(path.as_deref().unwrap_or(".")).await?;
            println!("{}", view::render_files(&browser));
        }
        FileCommand::Cat { path } => {
            browser.open(&file_entry(&path)).await?;
            print!("{}", browser.editor().as_str());
        }
        FileCommand::Save { path } => {
            browser.open(&file_entry(&path)).await?;
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| ControlError::Io(format!("stdin: {e}")))?;
            browser.apply_edit(content);
            browser.save().await?;
            println!("saved {path}");
        }
        FileCommand::Reload { path } => {
            println!("{}", browser.reload(&path).await?);
        }
        FileCommand::New { kind, name, dir } => {
            browser.list(dir.as_deref().unwrap_or(".")).await?;
            browser.create(kind, &name).await?;
            println!("{}", view::render_files(&browser));
        }
    }
    Ok(())
}

pub async fn run_tunnel<T: Transport>(
    transport: T,
    cmd: TunnelCommand,
) -> Result<(), ControlError> {
    let mut tunnels = TunnelController::new(transport);
    match cmd {
        TunnelCommand::Ls => {
            tunnels.list_tunnels().await?;
        }
        TunnelCommand::Start { port } => {
            println!("{}", tunnels.set_tunnel_state(port, TunnelAction::Start).await?);
        }
        TunnelCommand::Stop { port } => {
            println!("{}", tunnels.set_tunnel_state(port, TunnelAction::Stop).await?);
        }
        TunnelCommand::Conns { port } => {
            tunnels.list_tunnels().await?;
            tunnels.select_tunnel(port).await?;
        }
        TunnelCommand::Close { port, conn_id } => {
            tunnels.list_tunnels().await?;
            tunnels.select_tunnel(port).await?;
            println!(
                "{}",
                tunnels
                    .connection_action(&conn_id, ConnectionAction::Close)
                    .await?
            );
        }
        TunnelCommand::Reset { port, conn_id } => {
            tunnels.list_tunnels().await?;
            tunnels.select_tunnel(port).await?;
            println!(
                "{}",
                tunnels
                    .connection_action(&conn_id, ConnectionAction::Reset)
                    .await?
            );
        }
    }
    println!("{}", view::render_tunnels(&tunnels));
    Ok(())
}

/// Print log lines as they arrive. Errors only when the socket could not be
/// opened at all.
pub async fn run_logs<T: Transport>(transport: T, endpoint: &str) -> Result<(), ControlError> {
    follow_logs(
        &transport,
        endpoint,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await
}

/// Log lines go to `out`, status changes to `status`.
async fn follow_logs<T: Transport>(
    transport: &T,
    endpoint: &str,
    out: &mut impl Write,
    status: &mut impl Write,
) -> Result<(), ControlError> {
    let io_err = |e: std::io::Error| ControlError::Io(e.to_string());
    writeln!(status, "{}", view::render_log_status(&LogPanel::new())).map_err(io_err)?;

    let mut consumer = LogStreamConsumer::connect(transport, endpoint).await;
    if let Some(err) = consumer.error() {
        writeln!(status, "{}", view::render_log_status(consumer.panel())).map_err(io_err)?;
        return Err(ControlError::Transport(err.clone()));
    }
    writeln!(status, "{}", view::render_log_status(consumer.panel())).map_err(io_err)?;

    let mut write_result = Ok(());
    consumer
        .run(|panel, update| {
            let written = match update {
                LogUpdate::Appended(idx) => writeln!(out, "{}", panel.entries()[idx]),
                LogUpdate::Disconnected => {
                    writeln!(status, "{}", view::render_log_status(panel))
                }
            };
            if write_result.is_ok() {
                write_result = written;
            }
        })
        .await;
    write_result.map_err(io_err)
}
