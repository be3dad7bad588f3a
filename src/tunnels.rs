//! Tunnel and connection controller.
//!
//! Tunnel status is owned by the server. [`TunnelController`] never predicts
//! the next state of a tunnel or a connection: every start/stop/close/reset
//! request is followed by a full re-read of the affected list, whether the
//! request itself succeeded or not, so changes made by other clients are
//! picked up as well.

use tracing::{debug, info};

use crate::error::{decode, failed, ControlError};
use crate::model::{Connection, ConnectionAction, Tunnel, TunnelAction};
use crate::transport::Transport;

pub struct TunnelController<T> {
    transport: T,
    tunnels: Vec<Tunnel>,
    current_tunnel: Option<Tunnel>,
    connections: Vec<Connection>,
}

impl<T: Transport> TunnelController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            tunnels: Vec::new(),
            current_tunnel: None,
            connections: Vec::new(),
        }
    }

    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    pub fn current_tunnel(&self) -> Option<&Tunnel> {
        self.current_tunnel.as_ref()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET /tunnel`: replace the whole tunnel list.
    ///
    /// The selected tunnel's snapshot is refreshed when its port is still
    /// listed; the selection itself is only changed by the user.
    pub async fn list_tunnels(&mut self) -> Result<&[Tunnel], ControlError> {
        let body = self
            .transport
            .get("/tunnel", &[])
            .await
            .map_err(|e| failed("list tunnels", e))?;
        self.tunnels = decode(&body)?;

        if let Some(current) = &mut self.current_tunnel {
            if let Some(fresh) = self.tunnels.iter().find(|t| t.port == current.port) {
                current.clone_from(fresh);
            }
        }
        debug!("{} tunnel(s)", self.tunnels.len());
        Ok(&self.tunnels)
    }

    /// Select the cached tunnel on `port` and list its connections.
    pub async fn select_tunnel(&mut self, port: u16) -> Result<&[Connection], ControlError> {
        let tunnel = self
            .tunnels
            .iter()
            .find(|t| t.port == port)
            .cloned()
            .ok_or(ControlError::UnknownTunnel(port))?;
        self.current_tunnel = Some(tunnel);
        self.list_connections().await
    }

    /// `POST /tunnel?port=N&action=A`, then re-list all tunnels.
    ///
    /// The refresh runs even when the action fails. The action's error wins
    /// over a refresh error. On success returns the server's message.
    pub async fn set_tunnel_state(
        &mut self,
        port: u16,
        action: TunnelAction,
    ) -> Result<String, ControlError> {
        let port_str = port.to_string();
        let outcome = self
            .transport
            .post("/tunnel", &[("port", &port_str), ("action", action.as_str())])
            .await
            .map_err(|e| failed(action.as_str(), e));
        if outcome.is_ok() {
            info!("tunnel {port}: {} requested", action.as_str());
        }

        let refreshed = self.list_tunnels().await.map(|_| ());
        let message = outcome?;
        refreshed?;
        Ok(message)
    }

    /// `GET /tunnel/connection?port=N` for the selected tunnel. Without a
    /// selection this is a no-op returning the (empty) cache.
    pub async fn list_connections(&mut self) -> Result<&[Connection], ControlError> {
        let Some(tunnel) = &self.current_tunnel else {
            return Ok(&self.connections);
        };
        let port = tunnel.port.to_string();
        let body = self
            .transport
            .get("/tunnel/connection", &[("port", &port)])
            .await
            .map_err(|e| failed("list connections", e))?;
        self.connections = decode(&body)?;
        Ok(&self.connections)
    }

    /// `POST /tunnel/connection?port=N&conn_id=C&action=A` on the selected
    /// tunnel, then re-list its connections, even when the action fails.
    pub async fn connection_action(
        &mut self,
        conn_id: &str,
        action: ConnectionAction,
    ) -> Result<String, ControlError> {
        let port = self
            .current_tunnel
            .as_ref()
            .ok_or(ControlError::NoTunnelSelected)?
            .port
            .to_string();
        let outcome = self
            .transport
            .post(
                "/tunnel/connection",
                &[
                    ("port", &port),
                    ("conn_id", conn_id),
                    ("action", action.as_str()),
                ],
            )
            .await
            .map_err(|e| failed(action.as_str(), e));
        if outcome.is_ok() {
            info!("connection {conn_id} on {port}: {}", action.as_str());
        }

        let refreshed = self.list_connections().await.map(|_| ());
        let message = outcome?;
        refreshed?;
        Ok(message)
    }
}
