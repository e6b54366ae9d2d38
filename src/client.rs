use crate::connection::Connection;
use crate::correlator::Correlator;
use crate::error::{Result, SnapcastError};
use crate::protocol::RpcMethod;
use crate::subscription::{ControlEvent, EventReceiver};
use crate::types::{Group, Volume};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Default TCP port of the server's JSON-RPC control interface
pub const DEFAULT_PORT: u16 = 1705;

/// Client for controlling a Snapcast server
///
/// A `SnapcastClient` manages one persistent TCP connection to the server's
/// control interface. Commands are fire-and-forget: results and unsolicited
/// server notifications alike arrive as [`ControlEvent`]s on the stream
/// returned by [`subscribe`](Self::subscribe).
///
/// All methods take `&self` and are safe to call from concurrent tasks.
/// [`connect`](Self::connect) spawns the connection task and must be called
/// from within a Tokio runtime.
///
/// # Example
///
/// ```no_run
/// use snapcast_control::{ControlEvent, SnapcastClient, DEFAULT_PORT};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SnapcastClient::new();
///     let mut events = client.subscribe();
///     client.connect("192.168.1.2", DEFAULT_PORT);
///
///     while let Ok(event) = events.recv().await {
///         match event {
///             ControlEvent::Connected => client.get_server_status()?,
///             ControlEvent::Server { status, .. } => {
///                 for group in &status.groups {
///                     println!("group {} plays {}", group.id, group.stream_id);
///                 }
///                 break;
///             }
///             _ => {}
///         }
///     }
///
///     client.disconnect();
///     Ok(())
/// }
/// ```
pub struct SnapcastClient {
    state: Mutex<ManagerState>,
    correlator: Arc<Correlator>,
    event_tx: broadcast::Sender<ControlEvent>,
}

#[derive(Default)]
struct ManagerState {
    host: Option<String>,
    port: Option<u16>,
    connection: Option<Connection>,
}

impl SnapcastClient {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: Mutex::new(ManagerState::default()),
            correlator: Arc::new(Correlator::new()),
            event_tx,
        }
    }

    /// Subscribe to lifecycle and status events
    ///
    /// Multiple subscriptions can be active simultaneously; each receiver
    /// sees every event.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.event_tx.subscribe())
    }

    /// Connect to the server at `host:port`
    ///
    /// A no-op when already connected to the identical endpoint. When
    /// connected elsewhere, the old connection is torn down first. Returns
    /// immediately; progress arrives as [`ControlEvent::Connecting`],
    /// then [`ControlEvent::Connected`] or [`ControlEvent::Disconnected`].
    pub fn connect(&self, host: impl Into<String>, port: u16) {
        let host = host.into();
        let mut state = self.state.lock().unwrap();

        if let Some(connection) = &state.connection {
            if connection.is_connected()
                && state.host.as_deref() == Some(host.as_str())
                && state.port == Some(port)
            {
                return;
            }
            connection.stop();
            self.correlator.clear();
        }

        state.host = Some(host.clone());
        state.port = Some(port);
        state.connection = Some(Connection::start(
            host,
            port,
            self.correlator.clone(),
            self.event_tx.clone(),
        ));
    }

    /// Tear down the connection and drop every outstanding request
    ///
    /// Idempotent; safe to call when already disconnected.
    pub fn disconnect(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(connection) = state.connection.take() {
            connection.stop();
        }
        self.correlator.clear();
    }

    /// Whether a connection is currently established
    pub fn is_connected(&self) -> bool {
        let state = self.state.lock().unwrap();
        state
            .connection
            .as_ref()
            .is_some_and(|c| c.is_connected())
    }

    /// Host passed to the most recent [`connect`](Self::connect) call
    pub fn host(&self) -> Option<String> {
        self.state.lock().unwrap().host.clone()
    }

    /// Port passed to the most recent [`connect`](Self::connect) call
    pub fn port(&self) -> Option<u16> {
        self.state.lock().unwrap().port
    }

    fn send_request(&self, method: RpcMethod, params: Option<Value>) -> Result<()> {
        let state = self.state.lock().unwrap();
        let connection = state.connection.as_ref().ok_or(SnapcastError::NotConnected)?;
        if !connection.is_connected() {
            return Err(SnapcastError::NotConnected);
        }
        let request = self.correlator.next_request(method, params);
        connection.send(request.to_json()?)
    }

    // ========== Status ==========

    /// Request the full server status
    ///
    /// Answered by a [`ControlEvent::Server`] event.
    pub fn get_server_status(&self) -> Result<()> {
        self.send_request(RpcMethod::ServerGetStatus, None)
    }

    /// Request the status of a single client
    ///
    /// Answered by a [`ControlEvent::Client`] event.
    pub fn get_client_status(&self, client_id: &str) -> Result<()> {
        self.send_request(RpcMethod::ClientGetStatus, Some(json!({ "id": client_id })))
    }

    /// Request the status of a single group
    ///
    /// Answered by a [`ControlEvent::Group`] event.
    pub fn get_group_status(&self, group_id: &str) -> Result<()> {
        self.send_request(RpcMethod::GroupGetStatus, Some(json!({ "id": group_id })))
    }

    // ========== Client control ==========

    /// Set a client's display name
    pub fn set_client_name(&self, client_id: &str, name: &str) -> Result<()> {
        self.send_request(
            RpcMethod::ClientSetName,
            Some(json!({ "client": client_id, "name": name })),
        )
    }

    /// Set a client's playback latency offset in milliseconds
    pub fn set_client_latency(&self, client_id: &str, latency: i32) -> Result<()> {
        self.send_request(
            RpcMethod::ClientSetLatency,
            Some(json!({ "client": client_id, "latency": latency })),
        )
    }

    /// Set a client's volume percent and mute flag
    pub fn set_client_volume(&self, client_id: &str, volume: Volume) -> Result<()> {
        self.send_request(
            RpcMethod::ClientSetVolume,
            Some(json!({ "client": client_id, "volume": volume })),
        )
    }

    /// Remove a client from the server
    pub fn delete_client(&self, client_id: &str) -> Result<()> {
        self.send_request(
            RpcMethod::ServerDeleteClient,
            Some(json!({ "client": client_id })),
        )
    }

    // ========== Group control ==========

    /// Set the active stream of a group
    pub fn set_group_stream(&self, group_id: &str, stream_id: &str) -> Result<()> {
        self.send_request(
            RpcMethod::GroupSetStream,
            Some(json!({ "group": group_id, "id": stream_id })),
        )
    }

    /// Set the active stream of a group, taking the group record
    pub fn set_stream(&self, group: &Group, stream_id: &str) -> Result<()> {
        self.set_group_stream(&group.id, stream_id)
    }

    /// Replace a group's member list; order is preserved
    pub fn set_group_clients(&self, group_id: &str, client_ids: &[String]) -> Result<()> {
        self.send_request(
            RpcMethod::GroupSetClients,
            Some(json!({ "group": group_id, "clients": client_ids })),
        )
    }
}

impl Default for SnapcastClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_fail_when_never_connected() {
        let client = SnapcastClient::new();
        assert!(matches!(
            client.get_server_status(),
            Err(SnapcastError::NotConnected)
        ));
        assert!(matches!(
            client.set_client_volume("c1", Volume::new(50, false)),
            Err(SnapcastError::NotConnected)
        ));
        assert!(!client.is_connected());
    }

    #[test]
    fn endpoint_is_unset_before_first_connect() {
        let client = SnapcastClient::new();
        assert_eq!(client.host(), None);
        assert_eq!(client.port(), None);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let client = SnapcastClient::new();
        client.disconnect();
        client.disconnect();
        assert!(!client.is_connected());
    }
}
