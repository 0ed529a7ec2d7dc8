use crate::types::{NotifyError, Result};
use futures::{Sink, SinkExt};
use std::pin::Pin;
use tokio::sync::{Mutex, RwLock};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Write half of a transport, boxed so tests can substitute an in-memory sink
pub type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the write half of the transport and the current connection status
pub struct ConnectionManager {
    ws_write: Mutex<Option<WsSink>>,
    status: RwLock<ConnectionStatus>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            ws_write: Mutex::new(None),
            status: RwLock::new(ConnectionStatus::Disconnected),
        }
    }

    /// Sets the write sink (called after a successful handshake)
    pub async fn set_writer(&self, writer: WsSink) {
        let mut ws = self.ws_write.lock().await;
        *ws = Some(writer);
    }

    pub async fn status(&self) -> ConnectionStatus {
        *self.status.read().await
    }

    /// Sets the status, returning the previous one
    pub async fn set_status(&self, new_status: ConnectionStatus) -> ConnectionStatus {
        let mut status = self.status.write().await;
        std::mem::replace(&mut *status, new_status)
    }

    pub async fn is_connected(&self) -> bool {
        *self.status.read().await == ConnectionStatus::Connected
    }

    /// Sends a text frame through the open transport
    pub async fn send_text(&self, text: String) -> Result<()> {
        let mut ws_guard = self.ws_write.lock().await;
        let Some(ws) = ws_guard.as_mut() else {
            return Err(NotifyError::Connection("no open transport".to_string()));
        };
        ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Closes the transport gracefully and drops the writer
    pub async fn close(&self) -> Result<()> {
        let writer = self.ws_write.lock().await.take();
        self.set_status(ConnectionStatus::Disconnected).await;

        if let Some(mut ws) = writer {
            match ws.close().await {
                Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Drops the writer without a close handshake (the peer is already gone)
    pub async fn clear_writer(&self) {
        let mut ws = self.ws_write.lock().await;
        *ws = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
