use crate::error::{Result, SnapcastError};
use crate::protocol::{ClientEvent, RpcEvent};
use crate::types::{Client, Group, ServerStatus, Stream};
use tokio::sync::broadcast;

/// One event out of the control connection
///
/// Lifecycle transitions and classified status updates arrive interleaved on
/// the same stream. Entity updates carry their provenance: a reply to one of
/// our requests ([`RpcEvent::Response`]) or an unsolicited server
/// notification ([`RpcEvent::Notification`]).
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// Connection attempt started
    Connecting,

    /// TCP connection is established
    Connected,

    /// Connection is gone; `error` is `None` on a requested disconnect
    Disconnected { error: Option<String> },

    /// A client appeared, vanished, changed, or was deleted
    Client {
        origin: RpcEvent,
        event: ClientEvent,
        client: Client,
    },

    /// A group changed
    Group { origin: RpcEvent, group: Group },

    /// A stream changed
    Stream { origin: RpcEvent, stream: Stream },

    /// Full server status
    Server { origin: RpcEvent, status: ServerStatus },
}

/// Receiver for control events
pub struct EventReceiver {
    rx: broadcast::Receiver<ControlEvent>,
}

impl EventReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<ControlEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event
    pub async fn recv(&mut self) -> Result<ControlEvent> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => {
                SnapcastError::ChannelError("event stream closed".to_string())
            }
            broadcast::error::RecvError::Lagged(n) => {
                SnapcastError::ChannelError(format!("Lagged by {} messages", n))
            }
        })
    }

    /// Try to receive an event without blocking
    ///
    /// Returns `Ok(None)` if no event is queued.
    pub fn try_recv(&mut self) -> Result<Option<ControlEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(SnapcastError::ChannelError(
                "event stream closed".to_string(),
            )),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(SnapcastError::ChannelError(
                format!("Lagged by {} messages", n),
            )),
        }
    }
}
