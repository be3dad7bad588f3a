//! The uniform failure surface shared by every controller.
//!
//! A failed action is terminal: the controller keeps its prior cached state
//! and the user re-triggers the action by hand.

use tracing::warn;

use crate::transport::TransportError;

/// Errors returned by controller operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The request failed: server unreachable (`code == 0`) or a non-2xx
    /// status.
    Transport(TransportError),
    /// The server answered 2xx but the payload was not the expected JSON.
    Decode(String),
    /// File name rejected before any request was made.
    InvalidName(String),
    /// The action needs an open file.
    NoSession,
    /// The action needs a selected tunnel.
    NoTunnelSelected,
    /// No tunnel with this port in the cached list.
    UnknownTunnel(u16),
    /// No entry with this path in the cached listing.
    UnknownEntry(String),
    /// Local I/O around an edit: stdin, temp file, external editor.
    Io(String),
}

impl ControlError {
    /// Whether the failure was caught locally, without a network round-trip.
    pub fn is_local(&self) -> bool {
        !matches!(self, ControlError::Transport(_) | ControlError::Decode(_))
    }
}

impl From<TransportError> for ControlError {
    fn from(e: TransportError) -> Self {
        ControlError::Transport(e)
    }
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::Transport(e) => write!(f, "{e}"),
            ControlError::Decode(msg) => write!(f, "Unexpected response from server: {msg}"),
            ControlError::InvalidName(_) => {
                write!(f, "File name should only contain [A-Za-z0-9_\\-.]")
            }
            ControlError::NoSession => write!(f, "No file is open"),
            ControlError::NoTunnelSelected => write!(f, "No tunnel selected"),
            ControlError::UnknownTunnel(port) => write!(f, "No tunnel on port {port}"),
            ControlError::UnknownEntry(path) => write!(f, "No entry {path} in current listing"),
            ControlError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ControlError {}

/// Log a failed request and wrap it for the caller.
pub(crate) fn failed(action: &str, err: TransportError) -> ControlError {
    warn!(code = err.code, "{action} failed: {}", err.message);
    ControlError::Transport(err)
}

/// Decode a JSON response body.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ControlError> {
    serde_json::from_str(body).map_err(|e| {
        warn!("undecodable response: {e}");
        ControlError::Decode(e.to_string())
    })
}
