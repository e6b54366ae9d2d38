//! Rust library for controlling a Snapcast multi-room audio server
//!
//! This library speaks the server's JSON-RPC control protocol over a single
//! persistent TCP connection. It supports:
//!
//! - Server, group, and client status queries
//! - Client volume, mute, name, and latency control
//! - Group stream selection and member assignment
//! - Deleting stale clients from the server
//! - Real-time status notifications (client connect/disconnect, group,
//!   stream, and server updates)
//!
//! Commands are fire-and-forget: every result, like every unsolicited server
//! notification, is delivered asynchronously on the event stream returned by
//! [`SnapcastClient::subscribe`]. Entity updates carry an [`RpcEvent`] tag
//! telling response and notification apart.
//!
//! # Quick Start
//!
//! ```no_run
//! use snapcast_control::{ControlEvent, SnapcastClient, Volume, DEFAULT_PORT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SnapcastClient::new();
//!     let mut events = client.subscribe();
//!     client.connect("192.168.1.2", DEFAULT_PORT);
//!
//!     loop {
//!         match events.recv().await? {
//!             // ask for the full status once the connection is up
//!             ControlEvent::Connected => client.get_server_status()?,
//!             ControlEvent::Server { status, .. } => {
//!                 for group in &status.groups {
//!                     for member in &group.clients {
//!                         println!("{}: {}%", member.display_name(),
//!                             member.config.volume.percent);
//!                     }
//!                 }
//!                 client.set_client_volume("00:21:6a:7d:74:fc", Volume::new(50, false))?;
//!             }
//!             ControlEvent::Client { client: c, event, .. } => {
//!                 println!("client {} {:?}", c.id, event);
//!             }
//!             ControlEvent::Disconnected { error } => {
//!                 println!("connection lost: {:?}", error);
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Client**: connection management and the command API
//! - **Connection**: TCP socket handling and newline-delimited JSON framing
//! - **Correlator**: request-id allocation and outstanding-request tracking
//! - **Dispatch**: classification of inbound messages into typed events
//! - **Protocol**: JSON-RPC envelope structures
//! - **Types**: domain records (clients, groups, streams, server status)

mod client;
mod connection;
mod correlator;
mod dispatch;
mod error;
mod protocol;
mod subscription;
mod types;

// Public exports
pub use client::{SnapcastClient, DEFAULT_PORT};
pub use error::{Result, SnapcastError};
pub use protocol::{ClientEvent, RpcError, RpcEvent, RpcMethod};
pub use subscription::{ControlEvent, EventReceiver};
pub use types::{
    Client, ClientConfig, ClientId, Group, GroupId, Host, ServerInfo, ServerStatus,
    SnapclientInfo, SnapserverInfo, Stream, StreamId, StreamUri, TimeVal, Volume,
};
