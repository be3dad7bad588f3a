//! Live log stream consumer.
//!
//! [`LogStreamConsumer`] holds one persistent socket to the server's log
//! endpoint and appends every inbound frame, verbatim and in arrival order,
//! to an unbounded [`LogPanel`]. There is no reconnect: once the socket
//! drops the consumer stays [`LinkStatus::Disconnected`] and a new consumer
//! has to be created.

use futures_util::{Stream, StreamExt};
use tracing::{info, warn};

use crate::transport::{Transport, TransportError};

/// Default log endpoint on the server.
pub const DEFAULT_ENDPOINT: &str = "/ws/logs";

/// Connection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl LinkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Connecting => "connecting",
            LinkStatus::Connected => "connected",
            LinkStatus::Disconnected => "disconnected",
        }
    }
}

/// The rendered log: a status indicator plus append-only entries.
#[derive(Debug, Default)]
pub struct LogPanel {
    status: LinkStatus,
    entries: Vec<String>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn append(&mut self, line: String) -> usize {
        self.entries.push(line);
        self.entries.len() - 1
    }
}

/// What a single [`LogStreamConsumer::next`] call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogUpdate {
    /// A frame was appended at this index.
    Appended(usize),
    /// The socket closed; no further updates.
    Disconnected,
}

pub struct LogStreamConsumer<S> {
    frames: Option<S>,
    panel: LogPanel,
    error: Option<TransportError>,
}

impl<S> LogStreamConsumer<S>
where
    S: Stream<Item = Result<String, TransportError>> + Unpin,
{
    /// Open the socket at `endpoint`. A failed handshake yields a consumer
    /// that is already disconnected.
    pub async fn connect<T>(transport: &T, endpoint: &str) -> Self
    where
        T: Transport<Frames = S>,
    {
        let mut panel = LogPanel::new();
        match transport.connect(endpoint).await {
            Ok(frames) => {
                panel.status = LinkStatus::Connected;
                info!("log stream connected");
                Self {
                    frames: Some(frames),
                    panel,
                    error: None,
                }
            }
            Err(e) => {
                warn!(code = e.code, "log stream connect failed: {}", e.message);
                panel.status = LinkStatus::Disconnected;
                Self {
                    frames: None,
                    panel,
                    error: Some(e),
                }
            }
        }
    }

    pub fn panel(&self) -> &LogPanel {
        &self.panel
    }

    pub fn status(&self) -> LinkStatus {
        self.panel.status
    }

    /// Why the stream is disconnected, when it ended with an error.
    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// Wait for the next inbound event and apply it. Returns `None` once the
    /// consumer is disconnected.
    pub async fn next(&mut self) -> Option<LogUpdate> {
        let frames = self.frames.as_mut()?;
        match frames.next().await {
            Some(Ok(line)) => Some(LogUpdate::Appended(self.panel.append(line))),
            Some(Err(e)) => {
                warn!(code = e.code, "log stream error: {}", e.message);
                self.error = Some(e);
                Some(self.disconnect())
            }
            None => Some(self.disconnect()),
        }
    }

    /// Drain the stream until it closes, calling `on_update` after every
    /// applied event.
    pub async fn run(&mut self, mut on_update: impl FnMut(&LogPanel, LogUpdate)) {
        while let Some(update) = self.next().await {
            on_update(&self.panel, update);
        }
    }

    fn disconnect(&mut self) -> LogUpdate {
        self.frames = None;
        self.panel.status = LinkStatus::Disconnected;
        info!("log stream disconnected");
        LogUpdate::Disconnected
    }
}
