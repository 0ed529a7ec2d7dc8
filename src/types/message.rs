use serde::{Deserialize, Serialize};

/// Control frames the client itself sends to the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Keep-alive reply to a server `ping`
    Pong,
}

impl ControlMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pong_wire_format() {
        let json = ControlMessage::Pong.to_json().unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_pong_parses_back() {
        let parsed: ControlMessage = serde_json::from_str(r#"{"type":"pong"}"#).unwrap();
        assert_eq!(parsed, ControlMessage::Pong);
    }
}
