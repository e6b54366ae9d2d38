use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client identifier (usually the client's MAC address)
pub type ClientId = String;

/// Group identifier
pub type GroupId = String;

/// Stream identifier
pub type StreamId = String;

/// Volume setting: percent plus mute flag
///
/// No range clamping happens on this side; the server owns validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Volume {
    pub percent: u32,
    pub muted: bool,
}

impl Volume {
    pub fn new(percent: u32, muted: bool) -> Self {
        Self { percent, muted }
    }
}

/// Per-client settings as the server stores them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub instance: u32,

    /// Playback latency offset in milliseconds
    #[serde(default)]
    pub latency: i32,

    #[serde(default)]
    pub volume: Volume,
}

/// Host metadata reported by a client or the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Host {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

/// Wall-clock timestamp in seconds/microseconds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeVal {
    #[serde(default)]
    pub sec: i64,
    #[serde(default)]
    pub usec: i64,
}

/// Version info of the snapclient process behind a client entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapclientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "protocolVersion")]
    pub protocol_version: u32,
}

/// One playback client known to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,

    #[serde(default)]
    pub connected: bool,

    #[serde(default)]
    pub config: ClientConfig,

    #[serde(default)]
    pub host: Host,

    #[serde(default, rename = "lastSeen")]
    pub last_seen: TimeVal,

    #[serde(default)]
    pub snapclient: SnapclientInfo,
}

impl Client {
    /// Configured name, falling back to the host name when none is set
    pub fn display_name(&self) -> &str {
        if self.config.name.is_empty() {
            &self.host.name
        } else {
            &self.config.name
        }
    }
}

/// A group of clients playing one stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub muted: bool,

    #[serde(default)]
    pub stream_id: StreamId,

    #[serde(default)]
    pub clients: Vec<Client>,
}

impl Group {
    /// Ids of the clients in this group, in server order
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|c| c.id.clone()).collect()
    }
}

/// Source URI of a stream, split the way the server reports it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamUri {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub fragment: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

/// One audio source configured on the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    pub id: StreamId,

    /// Playback state as reported by the server ("idle", "playing", ...)
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub uri: StreamUri,
}

/// Version info of the snapserver process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapserverInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "protocolVersion")]
    pub protocol_version: u32,
    #[serde(default, rename = "controlProtocolVersion")]
    pub control_protocol_version: u32,
}

/// Server process and host metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub host: Host,
    #[serde(default)]
    pub snapserver: SnapserverInfo,
}

/// Full server status: the server itself plus all groups and streams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub server: ServerInfo,

    #[serde(default)]
    pub groups: Vec<Group>,

    #[serde(default)]
    pub streams: Vec<Stream>,
}

impl ServerStatus {
    /// Look up a group by id
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Look up a client by id across all groups
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.groups
            .iter()
            .flat_map(|g| g.clients.iter())
            .find(|c| c.id == id)
    }

    /// Look up a stream by id
    pub fn stream(&self, id: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_parses_from_server_json() {
        let json = r#"{
            "id": "00:21:6a:7d:74:fc",
            "connected": true,
            "config": {"instance": 1, "latency": 10, "name": "", "volume": {"muted": false, "percent": 74}},
            "host": {"arch": "x86_64", "ip": "192.168.0.54", "mac": "00:21:6a:7d:74:fc", "name": "t400", "os": "Linux"},
            "lastSeen": {"sec": 1488025696, "usec": 611255},
            "snapclient": {"name": "Snapclient", "protocolVersion": 2, "version": "0.10.0"}
        }"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert!(client.connected);
        assert_eq!(client.config.latency, 10);
        assert_eq!(client.config.volume.percent, 74);
        assert_eq!(client.last_seen.sec, 1488025696);
        assert_eq!(client.snapclient.protocol_version, 2);
    }

    #[test]
    fn display_name_falls_back_to_host_name() {
        let mut client: Client = serde_json::from_str(r#"{"id": "c1"}"#).unwrap();
        client.host.name = "t400".to_string();
        assert_eq!(client.display_name(), "t400");
        client.config.name = "Kitchen".to_string();
        assert_eq!(client.display_name(), "Kitchen");
    }

    #[test]
    fn server_status_lookups() {
        let json = r#"{
            "groups": [{
                "id": "g1",
                "stream_id": "s1",
                "clients": [{"id": "c1"}, {"id": "c2"}]
            }],
            "streams": [{"id": "s1", "status": "playing"}]
        }"#;
        let status: ServerStatus = serde_json::from_str(json).unwrap();
        assert!(status.group("g1").is_some());
        assert!(status.client("c2").is_some());
        assert!(status.client("missing").is_none());
        assert_eq!(status.stream("s1").unwrap().status, "playing");
        assert_eq!(status.group("g1").unwrap().client_ids(), vec!["c1", "c2"]);
    }

    #[test]
    fn volume_wire_shape() {
        let volume = Volume::new(42, true);
        let value = serde_json::to_value(&volume).unwrap();
        assert_eq!(value, serde_json::json!({"percent": 42, "muted": true}));
    }
}
