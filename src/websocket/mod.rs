mod factory;

pub use factory::{WebSocketFactory, WsStream, redact_token};
