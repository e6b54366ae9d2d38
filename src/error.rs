use thiserror::Error;

/// Result type for Snapcast control operations
pub type Result<T> = std::result::Result<T, SnapcastError>;

/// Errors that can occur when talking to a Snapcast server
#[derive(Error, Debug)]
pub enum SnapcastError {
    /// No established connection to send on
    #[error("Not connected")]
    NotConnected,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event channel receive error
    #[error("Channel error: {0}")]
    ChannelError(String),
}
