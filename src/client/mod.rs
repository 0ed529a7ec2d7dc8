// Module declarations
mod builder;
pub(crate) mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{NotificationClientBuilder, NotifierOptions};
pub use connection::{ConnectionManager, ConnectionStatus, WsSink};
pub use core::NotificationClient;
pub use state::ClientState;
