use super::{
    ClientState, ConnectionManager, ConnectionStatus, NotificationClientBuilder, NotifierOptions,
};
use crate::infrastructure::{HandlerRegistry, Subscription, TaskKind};
use crate::messaging::MessageRouter;
use crate::types::{Notification, NotifyError, Result};
use crate::types::constants::TOKEN_QUERY_PARAM;
use crate::websocket::{WebSocketFactory, WsStream};
use futures::stream::{SplitStream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// The live connection to the notification server.
///
/// `NotificationClient` owns a single WebSocket connection authenticated with a
/// bearer token, delivers validated notifications to registered handlers,
/// answers server pings, and reconnects with exponential backoff after an
/// unexpected close.
///
/// # Example
///
/// ```no_run
/// use realtime_notify::{NotificationClient, NotifierOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = NotificationClient::new("wss://api.example.com/ws/notifications", NotifierOptions::default())?;
///
/// let _sub = client.on_notification(|n| println!("{}: {}", n.title, n.message));
/// client.connect("user-token").await?;
/// // ...
/// client.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NotificationClient {
    pub(crate) endpoint: Url,
    pub(crate) options: NotifierOptions,

    // Connection manager
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    pub(crate) notification_handlers: HandlerRegistry<Notification>,
    pub(crate) connection_handlers: HandlerRegistry<bool>,
    pub(crate) events: broadcast::Sender<Notification>,
}

impl NotificationClient {
    /// Creates a new client without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::UrlParse`] for a malformed endpoint and
    /// [`NotifyError::InvalidConfig`] for a non-WebSocket scheme or invalid options.
    pub fn new(endpoint: impl AsRef<str>, options: NotifierOptions) -> Result<Self> {
        NotificationClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Opens the connection, authenticating with `token`.
    ///
    /// Resolves once the WebSocket handshake completes. If a connection is
    /// already open or being opened this returns `Ok(())` without opening a
    /// second one. The token is kept for automatic reconnection.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Auth`] for an empty token, or the transport error
    /// if the handshake fails. A failed handshake still arms the reconnect
    /// policy, exactly as an unexpected close would.
    pub async fn connect(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(NotifyError::Auth("token is required".to_string()));
        }

        let epoch = {
            let mut state = self.state.write().await;
            let status = self.connection.status().await;
            if status != ConnectionStatus::Disconnected {
                tracing::debug!("connect() called while {}, ignoring", status);
                return Ok(());
            }

            state.task_manager.abort(TaskKind::Reconnect);
            state.token = Some(token);
            state.was_manual_disconnect = false;
            state.reconnect_timer.reset();
            let epoch = state.next_epoch();

            self.connection.set_status(ConnectionStatus::Connecting).await;
            state.notify_status(ConnectionStatus::Connecting);
            epoch
        };

        if let Err(e) = self.open(epoch).await {
            tracing::error!("Connection attempt failed: {}", e);
            self.handle_transport_closed(epoch).await;
            return Err(e);
        }
        Ok(())
    }

    /// Performs the handshake for `epoch` and starts the read task
    async fn open(&self, epoch: u64) -> Result<()> {
        let url = {
            let state = self.state.read().await;
            let token = state
                .token
                .as_deref()
                .ok_or_else(|| NotifyError::Auth("no token to connect with".to_string()))?;
            self.build_endpoint_url(token)
        };

        tracing::info!("Connecting to {}", self.endpoint);
        let ws_stream = WebSocketFactory::create(url.as_str()).await?;
        let (write_half, read_half) = ws_stream.split();

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            drop(state);
            tracing::info!("Connection attempt superseded during handshake, closing it");
            let mut write_half = write_half;
            let _ = futures::SinkExt::close(&mut write_half).await;
            return Err(NotifyError::Connection(
                "connection attempt cancelled".to_string(),
            ));
        }

        self.connection.set_writer(Box::pin(write_half)).await;
        self.spawn_reader(&mut state, read_half, epoch);
        state.reconnect_timer.reset();

        let previous = self.connection.set_status(ConnectionStatus::Connected).await;
        state.notify_status(ConnectionStatus::Connected);
        drop(state);

        if previous != ConnectionStatus::Connected {
            self.connection_handlers.emit(&true);
        }
        tracing::info!("Connected to notification server");
        Ok(())
    }

    fn spawn_reader(&self, state: &mut ClientState, mut read_half: SplitStream<WsStream>, epoch: u64) {
        let router = MessageRouter::new(
            Arc::clone(&self.connection),
            self.notification_handlers.clone(),
            self.events.clone(),
        );
        let client = self.clone();

        state.task_manager.spawn(TaskKind::Reader, async move {
            tracing::info!("Starting read task");
            while let Some(msg_result) = read_half.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        tracing::debug!("Received text message: {}", text.as_str());
                        router.route(text.as_str()).await;
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(close_frame) = frame {
                            tracing::warn!(
                                "Server closed connection: code={:?}, reason='{}'",
                                close_frame.code,
                                close_frame.reason.as_str()
                            );
                        } else {
                            tracing::warn!("Server closed connection without close frame");
                        }
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        tracing::debug!("Received transport ping ({} bytes)", data.len());
                    }
                    Ok(Message::Pong(data)) => {
                        tracing::debug!("Received transport pong ({} bytes)", data.len());
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::warn!("Ignoring binary message ({} bytes)", data.len());
                    }
                    Ok(Message::Frame(_)) => {
                        tracing::debug!("Received raw frame (internal)");
                    }
                    Err(e) => {
                        tracing::error!("WebSocket read error: {}", e);
                        break;
                    }
                }
            }
            tracing::info!("Read task finished");
            client.handle_transport_closed(epoch).await;
        });
    }

    /// Marks the transport of `epoch` as gone and arms the reconnect policy
    async fn handle_transport_closed(&self, epoch: u64) {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!("Ignoring close of superseded connection");
            return;
        }

        state.task_manager.release(TaskKind::Reader);
        self.connection.clear_writer().await;
        let previous = self.connection.set_status(ConnectionStatus::Disconnected).await;
        state.notify_status(ConnectionStatus::Disconnected);

        if let Some(delay) = state.schedule_reconnect() {
            self.spawn_reconnect(&mut state, delay, epoch);
        }
        drop(state);

        if previous == ConnectionStatus::Connected {
            self.connection_handlers.emit(&false);
        }
    }

    fn spawn_reconnect(&self, state: &mut ClientState, delay: Duration, epoch: u64) {
        let client = self.clone();
        state.task_manager.spawn(TaskKind::Reconnect, async move {
            tokio::time::sleep(delay).await;
            client.reconnect(epoch).await;
        });
    }

    async fn reconnect(&self, epoch: u64) {
        let attempt = {
            let mut state = self.state.write().await;
            if state.epoch != epoch || state.was_manual_disconnect {
                return;
            }
            // From here on a failure re-arms the slot, so this task must not own it
            state.task_manager.release(TaskKind::Reconnect);

            let status = self.connection.status().await;
            if status != ConnectionStatus::Disconnected {
                tracing::info!("Already {}, stopping reconnection attempt", status);
                return;
            }
            self.connection.set_status(ConnectionStatus::Connecting).await;
            state.notify_status(ConnectionStatus::Connecting);
            state.reconnect_attempts()
        };

        tracing::info!("Attempting to reconnect (attempt {})...", attempt);
        match self.open(epoch).await {
            Ok(()) => tracing::info!("Reconnected successfully"),
            Err(e) => {
                tracing::error!("Reconnection attempt failed: {}", e);
                self.handle_transport_closed(epoch).await;
            }
        }
    }

    /// Closes the connection and cancels any pending reconnect.
    ///
    /// No automatic reconnection happens afterwards until [`connect`](Self::connect)
    /// is called again.
    pub async fn disconnect(&self) -> Result<()> {
        let (previous, closed) = {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = true;
            state.next_epoch();
            state.task_manager.abort_all();

            tracing::info!("Disconnecting from notification server");
            let previous = self.connection.status().await;
            let closed = self.connection.close().await;
            state.notify_status(ConnectionStatus::Disconnected);
            (previous, closed)
        };

        if previous == ConnectionStatus::Connected {
            self.connection_handlers.emit(&false);
        }
        closed?;

        tracing::info!("Disconnected from notification server");
        Ok(())
    }

    /// Sends a JSON payload if connected.
    ///
    /// While disconnected the payload is dropped with a warning and `Ok(())` is
    /// returned; nothing is queued.
    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        if !self.is_connected().await {
            tracing::warn!("Not connected, dropping outbound message");
            return Ok(());
        }

        let json = serde_json::to_string(payload)?;
        self.connection.send_text(json).await
    }

    /// Registers a handler called once per inbound notification, in receive order
    pub fn on_notification<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.notification_handlers.register(handler)
    }

    /// Registers a handler called with `true`/`false` on transitions to/from connected
    pub fn on_connection_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.connection_handlers
            .register(move |connected: &bool| handler(*connected))
    }

    /// Stream of every delivered notification, for code without a handler registered
    pub fn subscribe_events(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    pub async fn status_watcher(&self) -> watch::Receiver<ConnectionStatus> {
        self.state.read().await.status_tx.subscribe()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.connection.status().await
    }

    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.reconnect_attempts()
    }

    pub fn options(&self) -> &NotifierOptions {
        &self.options
    }

    /// Build the WebSocket endpoint URL with the token query parameter
    fn build_endpoint_url(&self, token: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
        url
    }
}
