use super::{ClientState, ConnectionManager, NotificationClient};
use crate::infrastructure::{Backoff, HandlerRegistry};
use crate::types::constants::{DEFAULT_EVENT_CAPACITY, MAX_RECONNECT_ATTEMPTS, RECONNECT_BASE_DELAY};
use crate::types::{NotifyError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use url::Url;

#[derive(Debug, Clone)]
pub struct NotifierOptions {
    /// Delay before the first reconnect attempt (milliseconds); doubled per attempt
    pub reconnect_base_delay: u64,
    /// Attempts after which automatic reconnection stops
    pub max_reconnect_attempts: u32,
    /// Buffer size of the broadcast stream returned by `subscribe_events`
    pub event_capacity: usize,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            reconnect_base_delay: RECONNECT_BASE_DELAY,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl NotifierOptions {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.reconnect_base_delay),
            self.max_reconnect_attempts,
        )
    }
}

/// Builder for NotificationClient that handles validation
pub struct NotificationClientBuilder {
    endpoint: Url,
    options: NotifierOptions,
}

impl NotificationClientBuilder {
    /// Create a new builder
    pub fn new(endpoint: impl AsRef<str>, options: NotifierOptions) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;

        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(NotifyError::InvalidConfig(format!(
                "endpoint scheme must be ws or wss, got '{}'",
                endpoint.scheme()
            )));
        }
        if options.reconnect_base_delay == 0 {
            return Err(NotifyError::InvalidConfig(
                "reconnect_base_delay must be positive".to_string(),
            ));
        }
        if options.event_capacity == 0 {
            return Err(NotifyError::InvalidConfig(
                "event_capacity must be positive".to_string(),
            ));
        }

        Ok(Self { endpoint, options })
    }

    pub fn build(self) -> NotificationClient {
        let (events, _) = broadcast::channel(self.options.event_capacity);
        let client_state = ClientState::new(self.options.backoff());

        NotificationClient {
            endpoint: self.endpoint,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(client_state)),
            notification_handlers: HandlerRegistry::new(),
            connection_handlers: HandlerRegistry::new(),
            events,
        }
    }
}
