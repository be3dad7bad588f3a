//! Pure `render(state) -> view-model` functions.
//!
//! View models carry stable keys (`path`, `port`, `conn_id`) instead of list
//! positions so an action taken on a row still targets the right entity after
//! a refresh. `Display` impls draw them for the terminal.

use std::fmt;

use crate::editor::Editor;
use crate::files::FileBrowser;
use crate::guard::Prompt;
use crate::logs::LogPanel;
use crate::model::EntryType;
use crate::transport::Transport;
use crate::tunnels::TunnelController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub key: String,
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesView {
    pub current_path: String,
    pub rows: Vec<EntryRow>,
    /// Open file, if any.
    pub current_file: Option<String>,
    pub mode: &'static str,
    /// Save is only offered while there are unsaved changes.
    pub save_enabled: bool,
}

pub fn render_files<T, P, E>(browser: &FileBrowser<T, P, E>) -> FilesView
where
    T: Transport,
    P: Prompt,
    E: Editor,
{
    let session = browser.session();
    FilesView {
        current_path: browser.current_path().to_string(),
        rows: browser
            .entries()
            .iter()
            .map(|e| EntryRow {
                key: e.path.clone(),
                name: e.name.clone(),
                is_dir: e.entry_type == EntryType::Dir,
            })
            .collect(),
        save_enabled: session.as_ref().is_some_and(|s| s.is_dirty),
        current_file: session.map(|s| s.path),
        mode: browser.mode().as_str(),
    }
}

impl fmt::Display for FilesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.current_path)?;
        for row in &self.rows {
            let marker = if row.is_dir { "d" } else { "-" };
            writeln!(f, "  {marker} {}", row.name)?;
        }
        match &self.current_file {
            Some(path) => {
                let dirty = if self.save_enabled { " *modified*" } else { "" };
                write!(f, "editing {path} [{}]{dirty}", self.mode)
            }
            None => write!(f, "no file open"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRow {
    pub key: u16,
    pub label: String,
    pub status: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRow {
    pub key: String,
    pub peer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelsView {
    pub rows: Vec<TunnelRow>,
    /// Label of the selected tunnel, shown above its connections.
    pub selected: Option<String>,
    pub connections: Vec<ConnectionRow>,
}

pub fn render_tunnels<T: Transport>(controller: &TunnelController<T>) -> TunnelsView {
    let selected_port = controller.current_tunnel().map(|t| t.port);
    TunnelsView {
        rows: controller
            .tunnels()
            .iter()
            .map(|t| TunnelRow {
                key: t.port,
                label: t.label(),
                status: t.status.as_str(),
                selected: Some(t.port) == selected_port,
            })
            .collect(),
        selected: controller.current_tunnel().map(|t| t.label()),
        connections: controller
            .connections()
            .iter()
            .map(|c| ConnectionRow {
                key: c.conn_id.clone(),
                peer: c.peer(),
            })
            .collect(),
    }
}

impl fmt::Display for TunnelsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tunnels:")?;
        if self.rows.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &self.rows {
            let marker = if row.selected { ">" } else { " " };
            writeln!(f, " {marker} {:<28} {}", row.label, row.status)?;
        }
        match &self.selected {
            Some(label) => {
                write!(f, "connections ({label}):")?;
                if self.connections.is_empty() {
                    write!(f, "\n  (none)")?;
                }
                for conn in &self.connections {
                    write!(f, "\n  {}  {}", conn.key, conn.peer)?;
                }
                Ok(())
            }
            None => write!(f, "no tunnel selected"),
        }
    }
}

/// Status line for the log panel.
pub fn render_log_status(panel: &LogPanel) -> String {
    format!(
        "[{}] {} line(s)",
        panel.status().as_str(),
        panel.entries().len()
    )
}
