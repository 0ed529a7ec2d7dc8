use super::{FrameKind, NotificationType};
use crate::types::Notification;
use crate::types::constants::DEFAULT_TITLE;
use crate::types::notification::synthesize_id;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an inbound text frame was dropped
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("invalid notification payload: {0}")]
    InvalidPayload(&'static str),
}

/// A validated inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Notification(Notification),
    Ping,
    Other(String),
}

impl InboundFrame {
    /// Parse a raw text frame, normalizing notification payloads
    pub fn parse(text: &str, now: DateTime<Utc>) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(FrameKind::parse)
            .ok_or(FrameError::MissingType)?;

        match kind {
            FrameKind::Notification => {
                let data = value
                    .get("data")
                    .ok_or(FrameError::InvalidPayload("missing `data`"))?;
                normalize_notification(data, now).map(Self::Notification)
            }
            FrameKind::Ping => Ok(Self::Ping),
            FrameKind::Other(other) => Ok(Self::Other(other)),
        }
    }
}

/// Build a Notification from the `data` object of a push frame.
pub fn normalize_notification(data: &Value, now: DateTime<Utc>) -> Result<Notification, FrameError> {
    let fields = data
        .as_object()
        .ok_or(FrameError::InvalidPayload("`data` is not an object"))?;

    Ok(Notification {
        id: id_field(fields).unwrap_or_else(|| synthesize_id(now)),
        title: str_field(fields, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        message: str_field(fields, "body")
            .or_else(|| str_field(fields, "message"))
            .unwrap_or_default(),
        kind: fields
            .get("type")
            .and_then(Value::as_str)
            .map(NotificationType::parse)
            .unwrap_or_default(),
        data: fields.get("data").and_then(Value::as_object).cloned(),
        timestamp: time_field(fields, "created_at")
            .or_else(|| time_field(fields, "timestamp"))
            .unwrap_or(now),
        read: false,
    })
}

fn id_field(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn time_field(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = fields.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
