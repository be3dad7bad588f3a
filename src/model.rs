//! Wire types for the mock server's control endpoints.
//!
//! Pure data, no I/O. Every collection is replaced wholesale by the
//! controller that owns it; identity across refreshes is by `path`, `port`
//! or `conn_id`, never by position.

use serde::Deserialize;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }
}

/// `GET /file/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryListing {
    pub current_path: String,
    pub entries: Vec<Entry>,
}

/// The file currently open for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub path: String,
    pub is_dirty: bool,
}

/// Tunnel status as reported by the server.
///
/// The server moves through `starting`/`stopping` while a transition is in
/// flight and reports the running state as `started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelStatus {
    Stopped,
    Starting,
    #[serde(alias = "started")]
    Running,
    Stopping,
}

impl TunnelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TunnelStatus::Stopped => "stopped",
            TunnelStatus::Starting => "starting",
            TunnelStatus::Running => "running",
            TunnelStatus::Stopping => "stopping",
        }
    }
}

/// A port-forwarding rule: local `port` → `dest_host:dest_port`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tunnel {
    pub port: u16,
    pub dest_host: String,
    pub dest_port: u16,
    pub status: TunnelStatus,
}

impl Tunnel {
    /// Display label `port=>dest_host:dest_port`.
    pub fn label(&self) -> String {
        format!("{}=>{}:{}", self.port, self.dest_host, self.dest_port)
    }
}

/// A live client socket proxied through a tunnel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Connection {
    pub conn_id: String,
    pub peer_ip: String,
    pub peer_port: u16,
}

impl Connection {
    pub fn peer(&self) -> String {
        format!("{}:{}", self.peer_ip, self.peer_port)
    }
}

/// What `POST /file` creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CreateKind {
    File,
    Folder,
}

impl CreateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CreateKind::File => "file",
            CreateKind::Folder => "folder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelAction {
    Start,
    Stop,
}

impl TunnelAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TunnelAction::Start => "start",
            TunnelAction::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Close,
    Reset,
}

impl ConnectionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionAction::Close => "close",
            ConnectionAction::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_parses_server_payload() {
        let listing: DirectoryListing = serde_json::from_str(
            r#"{"current_path": ".", "entries": [
                {"type": "dir", "path": "..", "name": ".."},
                {"type": "file", "path": "./a.txt", "name": "a.txt"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(listing.current_path, ".");
        assert!(listing.entries[0].is_dir());
        assert_eq!(listing.entries[1].entry_type, EntryType::File);
    }

    #[test]
    fn tunnel_status_accepts_server_spelling() {
        let tunnels: Vec<Tunnel> = serde_json::from_str(
            r#"[{"port": 8080, "dest_host": "10.0.0.2", "dest_port": 80, "status": "started"},
                {"port": 9090, "dest_host": "db", "dest_port": 5432, "status": "stopped"}]"#,
        )
        .unwrap();
        assert_eq!(tunnels[0].status, TunnelStatus::Running);
        assert_eq!(tunnels[1].status, TunnelStatus::Stopped);
        assert_eq!(tunnels[0].label(), "8080=>10.0.0.2:80");
    }

    #[test]
    fn unknown_tunnel_status_is_rejected() {
        let res: Result<Tunnel, _> = serde_json::from_str(
            r#"{"port": 1, "dest_host": "h", "dest_port": 2, "status": "exploded"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn connection_peer_label() {
        let conn: Connection =
            serde_json::from_str(r#"{"conn_id": "AB12CD34", "peer_ip": "127.0.0.1", "peer_port": 51234}"#)
                .unwrap();
        assert_eq!(conn.peer(), "127.0.0.1:51234");
    }
}
