pub mod constants;
pub mod error;
pub mod message;
pub mod notification;

pub use constants::*;
pub use error::{NotifyError, Result};
pub use message::ControlMessage;
pub use notification::{NewNotification, Notification, synthesize_id};
