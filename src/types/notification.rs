use crate::messaging::NotificationType;
use crate::types::constants::{ID_PREFIX, ID_SUFFIX_LEN};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A notification record as delivered to handlers and kept by the store.
///
/// Everything but `read` is fixed once the record exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    /// Opaque payload passed through untouched (deep links and such)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(alias = "created_at")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// A notification that has not been assigned an id or timestamp yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub data: Option<Map<String, Value>>,
}

impl NewNotification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationType,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Assign an id and timestamp, producing an unread record
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: synthesize_id(now),
            title: self.title,
            message: self.message,
            kind: self.kind,
            data: self.data,
            timestamp: now,
            read: false,
        }
    }
}

/// Generate a local id of the form `notif_{millis}_{base36}`.
pub fn synthesize_id(now: DateTime<Utc>) -> String {
    let space = 36u64.pow(ID_SUFFIX_LEN as u32);
    let suffix = to_base36(rand::rng().random_range(0..space));
    format!("{}{}_{}", ID_PREFIX, now.timestamp_millis(), suffix)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    // Pad to the suffix length so small values still yield full-width ids
    let mut out = Vec::with_capacity(ID_SUFFIX_LEN);
    while value > 0 || out.len() < ID_SUFFIX_LEN {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
