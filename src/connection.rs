use crate::correlator::Correlator;
use crate::dispatch;
use crate::error::{Result, SnapcastError};
use crate::subscription::ControlEvent;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::{Framed, LinesCodec};

/// One TCP connection to a server
///
/// `start` spawns the connection task and returns immediately; establishment
/// and teardown surface as [`ControlEvent`] lifecycle events. Messages are
/// newline-delimited JSON in both directions.
pub(crate) struct Connection {
    line_tx: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
    stop_tx: broadcast::Sender<()>,
}

impl Connection {
    /// Spawn the connection task for `host:port`
    ///
    /// Inbound lines run through the dispatcher and come out as events on
    /// `events`; the pending table in `correlator` is cleared on every exit
    /// path, so no reply can resolve a request from before the teardown.
    pub(crate) fn start(
        host: String,
        port: u16,
        correlator: Arc<Correlator>,
        events: broadcast::Sender<ControlEvent>,
    ) -> Self {
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let connected = Arc::new(AtomicBool::new(false));

        let task_connected = connected.clone();
        tokio::spawn(async move {
            run_connection(host, port, line_rx, stop_rx, task_connected, correlator, events).await;
        });

        Self {
            line_tx,
            connected,
            stop_tx,
        }
    }

    /// Whether the socket is currently established
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Queue one line for sending; fire and forget
    pub(crate) fn send(&self, line: String) -> Result<()> {
        if !self.is_connected() {
            return Err(SnapcastError::NotConnected);
        }
        self.line_tx
            .send(line)
            .map_err(|_| SnapcastError::NotConnected)
    }

    /// Ask the connection task to shut down
    pub(crate) fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

async fn run_connection(
    host: String,
    port: u16,
    mut line_rx: mpsc::UnboundedReceiver<String>,
    mut stop_rx: broadcast::Receiver<()>,
    connected: Arc<AtomicBool>,
    correlator: Arc<Correlator>,
    events: broadcast::Sender<ControlEvent>,
) {
    tracing::info!("Connecting to {}:{}", host, port);
    let _ = events.send(ControlEvent::Connecting);

    let stream = tokio::select! {
        _ = stop_rx.recv() => {
            // stopped before the socket came up
            let _ = events.send(ControlEvent::Disconnected { error: None });
            return;
        }
        result = TcpStream::connect((host.as_str(), port)) => match result {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Failed to connect to {}:{}: {}", host, port, e);
                let _ = events.send(ControlEvent::Disconnected { error: Some(e.to_string()) });
                return;
            }
        },
    };

    tracing::info!("Connected to {}:{}", host, port);
    connected.store(true, Ordering::SeqCst);
    let _ = events.send(ControlEvent::Connected);

    let framed = Framed::new(stream, LinesCodec::new());
    let (mut sink, mut lines) = framed.split();

    let error = loop {
        tokio::select! {
            _ = stop_rx.recv() => break None,
            outgoing = line_rx.recv() => match outgoing {
                Some(line) => {
                    tracing::debug!("Sending: {}", line);
                    if let Err(e) = sink.send(line).await {
                        tracing::error!("Failed to send message: {}", e);
                        break Some(e.to_string());
                    }
                }
                // the handle owning the sender is gone
                None => break None,
            },
            incoming = lines.next() => match incoming {
                Some(Ok(line)) => {
                    if let Some(event) = dispatch::handle_message(&line, &correlator) {
                        let _ = events.send(event);
                    }
                }
                Some(Err(e)) => {
                    tracing::error!("Read error: {}", e);
                    break Some(e.to_string());
                }
                None => {
                    tracing::info!("Connection closed by server");
                    break Some("connection closed by server".to_string());
                }
            },
        }
    };

    connected.store(false, Ordering::SeqCst);
    correlator.clear();
    let _ = events.send(ControlEvent::Disconnected { error });
}
