use crate::types::constants::frame_types;
use serde::{Deserialize, Serialize};

/// Category of a notification.
///
/// The set covers both console-originated notifications (alerts, broadcasts)
/// and social interactions (follows, likes, comments). Unknown values coming
/// off the wire or out of storage map to [`NotificationType::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    SystemAlert,
    Broadcast,
    Personal,
    Message,
    Follow,
    Like,
    Comment,
    Success,
    Error,
    Info,
    #[default]
    #[serde(other)]
    Custom,
}

impl NotificationType {
    /// Parse a wire string into a NotificationType
    pub fn parse(s: &str) -> Self {
        match s {
            "system_alert" => Self::SystemAlert,
            "broadcast" => Self::Broadcast,
            "personal" => Self::Personal,
            "message" => Self::Message,
            "follow" => Self::Follow,
            "like" => Self::Like,
            "comment" => Self::Comment,
            "success" => Self::Success,
            "error" => Self::Error,
            "info" => Self::Info,
            _ => Self::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAlert => "system_alert",
            Self::Broadcast => "broadcast",
            Self::Personal => "personal",
            Self::Message => "message",
            Self::Follow => "follow",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discriminator of an inbound frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Notification,
    Ping,
    /// Anything else; kept for logging only
    Other(String),
}

impl FrameKind {
    pub fn parse(s: &str) -> Self {
        match s {
            frame_types::NOTIFICATION => Self::Notification,
            frame_types::PING => Self::Ping,
            _ => Self::Other(s.to_string()),
        }
    }
}
