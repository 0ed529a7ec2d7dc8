// Messaging module - Inbound frame parsing and routing
pub mod event;
pub mod frame;
pub mod router;

pub use event::{FrameKind, NotificationType};
pub use frame::{FrameError, InboundFrame, normalize_notification};
pub use router::{MessageRouter, RouteOutcome};
