//! Interactive line-oriented front-end.
//!
//! Wraps one [`FileBrowser`] and one [`TunnelController`] and prints the
//! rendered view after every command. Errors from any action are printed the
//! same way and never end the session. Leaving by `quit`, Ctrl-C or end of
//! input all go through the unsaved-changes check.

use std::io::{self, Write};
use std::process::Command;

use tracing::debug;

use crate::console::{InputEvent, LineInput};
use crate::editor::{Editor, EditorMode, TextBuffer};
use crate::error::ControlError;
use crate::files::{FileBrowser, OpenOutcome};
use crate::guard::Prompt;
use crate::model::{ConnectionAction, CreateKind, TunnelAction};
use crate::transport::Transport;
use crate::tunnels::TunnelController;
use crate::view;

const HELP: &str = "\
files:
  ls [PATH]          list PATH (default: refresh current directory)
  cd PATH            same as ls PATH
  open NAME|PATH     open a file or enter a directory from the listing
  show               print the open file
  set TEXT           replace the open file's content with TEXT
  append TEXT        append a line to the open file
  edit               edit the open file in $VISUAL / $EDITOR
  save               write the open file to the server
  mode NAME          set the syntax mode: plain_text, json or python
  reload [PATH]      ask the server to reload PATH (default: open file)
  mkfile NAME        create a file in the current directory
  mkdir NAME         create a folder in the current directory
tunnels:
  tunnels            list tunnels
  select PORT        select a tunnel and list its connections
  start PORT         start a tunnel
  stop PORT          stop a tunnel
  conns              refresh the selected tunnel's connections
  close CONN         close a connection on the selected tunnel
  reset CONN         reset a connection on the selected tunnel
  help               this text
  quit               leave (asks first if there are unsaved changes)";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Ls(Option<String>),
    Open(String),
    Show,
    Set(String),
    Append(String),
    Edit,
    Save,
    Mode(EditorMode),
    Reload(Option<String>),
    New(CreateKind, String),
    Tunnels,
    Select(u16),
    Tunnel(u16, TunnelAction),
    Conns,
    Connection(String, ConnectionAction),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = |usage: &str| {
        if rest.is_empty() {
            Err(format!("usage: {usage}"))
        } else {
            Ok(rest.to_string())
        }
    };
    let port = |usage: &str| {
        arg(usage)?
            .parse::<u16>()
            .map_err(|_| format!("invalid port '{rest}'"))
    };
    let optional = (!rest.is_empty()).then(|| rest.to_string());

    Ok(match word {
        "" => ShellCommand::Empty,
        "ls" | "cd" => ShellCommand::Ls(optional),
        "open" => ShellCommand::Open(arg("open NAME|PATH")?),
        "show" | "cat" => ShellCommand::Show,
        "set" => ShellCommand::Set(rest.to_string()),
        "append" => ShellCommand::Append(rest.to_string()),
        "edit" => ShellCommand::Edit,
        "save" => ShellCommand::Save,
        "mode" => ShellCommand::Mode(arg("mode NAME")?.parse()?),
        "reload" => ShellCommand::Reload(optional),
        "mkfile" => ShellCommand::New(CreateKind::File, arg("mkfile NAME")?),
        "mkdir" => ShellCommand::New(CreateKind::Folder, arg("mkdir NAME")?),
        "tunnels" => ShellCommand::Tunnels,
        "select" => ShellCommand::Select(port("select PORT")?),
        "start" => ShellCommand::Tunnel(port("start PORT")?, TunnelAction::Start),
        "stop" => ShellCommand::Tunnel(port("stop PORT")?, TunnelAction::Stop),
        "conns" => ShellCommand::Conns,
        "close" => ShellCommand::Connection(arg("close CONN")?, ConnectionAction::Close),
        "reset" => ShellCommand::Connection(arg("reset CONN")?, ConnectionAction::Reset),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    })
}

pub struct Shell<T, P> {
    files: FileBrowser<T, P, TextBuffer>,
    tunnels: TunnelController<T>,
    editor_command: String,
}

impl<T: Transport, P: Prompt> Shell<T, P> {
    pub fn new(
        files: FileBrowser<T, P, TextBuffer>,
        tunnels: TunnelController<T>,
        editor_command: String,
    ) -> Self {
        Self {
            files,
            tunnels,
            editor_command,
        }
    }

    pub fn files(&self) -> &FileBrowser<T, P, TextBuffer> {
        &self.files
    }

    pub fn tunnels(&self) -> &TunnelController<T> {
        &self.tunnels
    }

    /// Run until a confirmed `quit` or Ctrl-C, or end of input.
    pub async fn run<I: LineInput, W: Write>(
        &mut self,
        input: &mut I,
        out: &mut W,
    ) -> io::Result<()> {
        // Best-effort initial state; the server may not be up yet.
        for cmd in [ShellCommand::Ls(None), ShellCommand::Tunnels] {
            match self.execute(cmd).await {
                Ok(text) => writeln!(out, "{text}")?,
                Err(e) => writeln!(out, "error: {e}")?,
            }
        }

        loop {
            write!(out, "mockctl> ")?;
            out.flush()?;
            let line = match input.next_event().await? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupt => {
                    writeln!(out)?;
                    if self.files.confirm_leave() {
                        return Ok(());
                    }
                    continue;
                }
                InputEvent::Eof => {
                    if !self.files.confirm_leave() {
                        writeln!(out, "\ninput closed, unsaved changes dropped")?;
                    }
                    writeln!(out)?;
                    return Ok(());
                }
            };

            let cmd = match parse_command(&line) {
                Ok(cmd) => cmd,
                Err(msg) => {
                    writeln!(out, "{msg}")?;
                    continue;
                }
            };
            debug!(?cmd, "shell command");
            match cmd {
                ShellCommand::Empty => {}
                ShellCommand::Help => writeln!(out, "{HELP}")?,
                ShellCommand::Quit => {
                    if self.files.confirm_leave() {
                        return Ok(());
                    }
                }
                cmd => match self.execute(cmd).await {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => writeln!(out, "{text}")?,
                    Err(e) => writeln!(out, "error: {e}")?,
                },
            }
        }
    }

    /// Apply one command and return what to print.
    async fn execute(&mut self, cmd: ShellCommand) -> Result<String, ControlError> {
        match cmd {
            ShellCommand::Ls(path) => {
                let path = path.unwrap_or_else(|| self.files.current_path().to_string());
                self.files.list(&path).await?;
                Ok(self.files_view())
            }
            ShellCommand::Open(target) => match self.files.open_path(&target).await? {
                OpenOutcome::Cancelled => Ok("kept current file".to_string()),
                OpenOutcome::Listed => Ok(self.files_view()),
                OpenOutcome::Opened => Ok(format!(
                    "{}\n{}",
                    self.files.editor().as_str(),
                    self.files_view()
                )),
            },
            ShellCommand::Show => {
                self.require_session()?;
                Ok(self.files.editor().as_str().to_string())
            }
            ShellCommand::Set(text) => {
                self.require_session()?;
                self.files.apply_edit(text);
                Ok(self.files_view())
            }
            ShellCommand::Append(text) => {
                self.require_session()?;
                let mut content = self.files.editor().value();
                if !content.is_empty() && !content.ends_with('\n') {
                    content.push('\n');
                }
                content.push_str(&text);
                content.push('\n');
                self.files.apply_edit(content);
                Ok(self.files_view())
            }
            ShellCommand::Edit => {
                let path = self.require_session()?;
                let before = self.files.editor().value();
                let after = edit_externally(&self.editor_command, &path, &before)?;
                if after != before {
                    self.files.apply_edit(after);
                }
                Ok(self.files_view())
            }
            ShellCommand::Save => {
                self.files.save().await?;
                Ok(self.files_view())
            }
            ShellCommand::Mode(mode) => {
                self.files.set_mode(mode);
                Ok(self.files_view())
            }
            ShellCommand::Reload(Some(path)) => self.files.reload(&path).await,
            ShellCommand::Reload(None) => self.files.reload_session().await,
            ShellCommand::New(kind, name) => {
                self.files.create(kind, &name).await?;
                Ok(self.files_view())
            }
            ShellCommand::Tunnels => {
                self.tunnels.list_tunnels().await?;
                Ok(self.tunnels_view())
            }
            ShellCommand::Select(port) => {
                self.tunnels.select_tunnel(port).await?;
                Ok(self.tunnels_view())
            }
            ShellCommand::Tunnel(port, action) => {
                let message = self.tunnels.set_tunnel_state(port, action).await?;
                Ok(format!("{message}\n{}", self.tunnels_view()))
            }
            ShellCommand::Conns => {
                self.tunnels.list_connections().await?;
                Ok(self.tunnels_view())
            }
            ShellCommand::Connection(conn_id, action) => {
                let message = self.tunnels.connection_action(&conn_id, action).await?;
                Ok(format!("{message}\n{}", self.tunnels_view()))
            }
            ShellCommand::Empty | ShellCommand::Help | ShellCommand::Quit => Ok(String::new()),
        }
    }

    fn require_session(&self) -> Result<String, ControlError> {
        self.files
            .session()
            .map(|s| s.path)
            .ok_or(ControlError::NoSession)
    }

    fn files_view(&self) -> String {
        view::render_files(&self.files).to_string()
    }

    fn tunnels_view(&self) -> String {
        view::render_tunnels(&self.tunnels).to_string()
    }
}

/// Round-trip `content` through an external editor. The temp file keeps
/// the remote file name as its suffix so the editor picks its own
/// highlighting, and is removed when the [`tempfile::TempPath`] drops.
fn edit_externally(
    command: &str,
    remote_path: &str,
    content: &str,
) -> Result<String, ControlError> {
    let io_err = |e: io::Error| ControlError::Io(e.to_string());
    let name = remote_path.rsplit('/').next().unwrap_or("buffer");

    let mut words = command.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| ControlError::Io("editor command is empty".to_string()))?;

    let mut temp = tempfile::Builder::new()
        .prefix("mockctl-")
        .suffix(&format!("-{name}"))
        .tempfile()
        .map_err(io_err)?;
    temp.write_all(content.as_bytes()).map_err(io_err)?;
    let path = temp.into_temp_path();

    let status = Command::new(program)
        .args(words)
        .arg(&*path)
        .status()
        .map_err(|e| ControlError::Io(format!("{program}: {e}")))?;
    if !status.success() {
        return Err(ControlError::Io(format!("{program} exited with {status}")));
    }
    std::fs::read_to_string(&path).map_err(io_err)
}
