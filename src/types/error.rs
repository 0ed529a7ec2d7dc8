use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur when using the notification client or store.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Persisted storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem error from a file-backed storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Options rejected by the client builder
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for `Result<T, NotifyError>`.
pub type Result<T> = std::result::Result<T, NotifyError>;
