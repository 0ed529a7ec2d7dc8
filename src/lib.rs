//! # Realtime Notify
//!
//! A real-time notification client: one authenticated WebSocket connection
//! with exponential-backoff reconnection, plus a persisted, capped notification
//! store that stays in sync across every context sharing its storage.
//!
//! ## Example
//!
//! ```no_run
//! use realtime_notify::{
//!     LogAlertSink, NotificationClient, NotificationStore, NotifierOptions, SharedStorage,
//!     StoreOptions,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NotificationClient::new(
//!         "wss://api.example.com/ws/notifications",
//!         NotifierOptions::default(),
//!     )?;
//!
//!     let storage = SharedStorage::open_dir("./notify-data")?;
//!     let store = Arc::new(NotificationStore::new(
//!         storage.context(),
//!         Arc::new(LogAlertSink::default()),
//!         StoreOptions::default(),
//!     ));
//!     let _feed = store.attach(&client);
//!
//!     client.connect("user-token").await?;
//!     tokio::signal::ctrl_c().await?;
//!
//!     println!("{} unread", store.unread_count());
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod store;
pub mod types;
pub mod websocket;

pub use client::{ConnectionStatus, NotificationClient, NotifierOptions};
pub use infrastructure::Subscription;
pub use messaging::{FrameError, InboundFrame, NotificationType};
pub use store::{
    AlertSink, Chime, LogAlertSink, NotificationStore, PopupPermission, SharedStorage,
    StorageContext, StorageEvent, StoreOptions,
};
pub use types::{NewNotification, Notification, NotifyError, Result};
