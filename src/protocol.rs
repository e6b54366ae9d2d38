use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// The fixed set of outbound request methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    #[serde(rename = "Server.GetStatus")]
    ServerGetStatus,
    #[serde(rename = "Client.GetStatus")]
    ClientGetStatus,
    #[serde(rename = "Group.GetStatus")]
    GroupGetStatus,
    #[serde(rename = "Client.SetName")]
    ClientSetName,
    #[serde(rename = "Client.SetLatency")]
    ClientSetLatency,
    #[serde(rename = "Client.SetVolume")]
    ClientSetVolume,
    #[serde(rename = "Group.SetStream")]
    GroupSetStream,
    #[serde(rename = "Group.SetClients")]
    GroupSetClients,
    #[serde(rename = "Server.DeleteClient")]
    ServerDeleteClient,
}

impl RpcMethod {
    /// Wire name of this method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerGetStatus => "Server.GetStatus",
            Self::ClientGetStatus => "Client.GetStatus",
            Self::GroupGetStatus => "Group.GetStatus",
            Self::ClientSetName => "Client.SetName",
            Self::ClientSetLatency => "Client.SetLatency",
            Self::ClientSetVolume => "Client.SetVolume",
            Self::GroupSetStream => "Group.SetStream",
            Self::GroupSetClients => "Group.SetClients",
            Self::ServerDeleteClient => "Server.DeleteClient",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound JSON-RPC request envelope
///
/// Immutable once built; construction goes through the correlator so that
/// every envelope is registered in the pending-request table.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub jsonrpc: String,
    pub id: u64,
    pub method: RpcMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestEnvelope {
    pub(crate) fn new(id: u64, method: RpcMethod, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params,
        }
    }

    /// Serialize to a single JSON line
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// JSON-RPC error object carried inside a response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}: {}", self.code, self.message)
    }
}

/// Inbound response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// Inbound notification envelope; the missing `id` field is what
/// distinguishes it from a response
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub method: String,
    pub params: Value,
}

/// One decoded inbound message
///
/// Variants are tried in order, so any message carrying an `id` field is a
/// response regardless of what else it carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Response(ResponseEnvelope),
    Notification(NotificationEnvelope),
}

/// Provenance of a delivered update: answer to one of our requests, or an
/// unsolicited server-initiated notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcEvent {
    Response,
    Notification,
}

/// What happened to a client, derived from the `Client.On*` wire suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    Updated,
    Deleted,
}

impl ClientEvent {
    /// Map a notification method name to its event kind, if it is one of
    /// the four known `Client.On*` names
    pub fn from_wire(method: &str) -> Option<Self> {
        match method {
            "Client.OnConnect" => Some(Self::Connected),
            "Client.OnDisconnect" => Some(Self::Disconnected),
            "Client.OnUpdate" => Some(Self::Updated),
            "Client.OnDelete" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Wire name this event kind maps back to
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Connected => "Client.OnConnect",
            Self::Disconnected => "Client.OnDisconnect",
            Self::Updated => "Client.OnUpdate",
            Self::Deleted => "Client.OnDelete",
        }
    }
}

/// Resolved target of an inbound update method name
///
/// The whole fixed notification method set collapses into this one lookup,
/// so classification happens exactly once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateKind {
    Client(ClientEvent),
    Stream,
    Group,
    Server,
}

impl UpdateKind {
    pub(crate) fn from_method(method: &str) -> Option<Self> {
        if let Some(event) = ClientEvent::from_wire(method) {
            return Some(Self::Client(event));
        }
        match method {
            "Stream.OnUpdate" => Some(Self::Stream),
            "Group.OnUpdate" => Some(Self::Group),
            "Server.OnUpdate" => Some(Self::Server),
            _ => None,
        }
    }
}
