use crate::types::Result;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating WebSocket connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Open a WebSocket connection, resolving once the handshake completes
    pub async fn create(url: &str) -> Result<WsStream> {
        tracing::debug!("Creating WebSocket connection to: {}", redact_token(url));
        let (stream, response) = connect_async(url).await?;
        tracing::debug!("Handshake completed with status {}", response.status());
        Ok(stream)
    }
}

/// Strip the query string so tokens never reach the logs
pub fn redact_token(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
