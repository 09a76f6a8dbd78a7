use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

#[derive(Debug, Clone, Deserialize)]
pub struct SignalMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub to: Option<Value>,
    #[serde(default)]
    pub from: Option<Value>,
    #[serde(default)]
    pub muted: Option<Value>,
    #[serde(default, rename = "cameraOff")]
    pub camera_off: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Join,
    Offer,
    Answer,
    Ice,
    End,
    Status,
    UsersInRoom,
    Unknown,
}

impl MessageKind {
    pub fn is_relayed(self) -> bool {
        matches!(self, Self::Offer | Self::Answer | Self::Ice)
    }
}

impl From<&str> for MessageKind {
    fn from(kind: &str) -> Self {
        match kind {
            "join" => Self::Join,
            "offer" => Self::Offer,
            "answer" => Self::Answer,
            "ice" => Self::Ice,
            "end" => Self::End,
            "status" => Self::Status,
            "users-in-room" => Self::UsersInRoom,
            _ => Self::Unknown,
        }
    }
}

impl SignalMessage {
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RelayError::MalformedMessage(e.to_string()))?;
        if !value.is_object() {
            return Err(RelayError::MalformedMessage(
                "frame is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| RelayError::MalformedMessage(e.to_string()))
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::from(self.kind.as_str())
    }

    pub fn recipient(&self) -> Option<&str> {
        self.to.as_ref().and_then(Value::as_str)
    }

    pub fn status_update(&self, sender: &str) -> ServerMessage {
        ServerMessage::Status {
            // Deliberate: a status without `from` is attributed to its sender
            // instead of being rejected.
            from: self
                .from
                .clone()
                .unwrap_or_else(|| Value::String(sender.to_string())),
            muted: self.muted.clone().unwrap_or(Value::Bool(false)),
            camera_off: self.camera_off.clone().unwrap_or(Value::Bool(false)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    UsersInRoom {
        users: Vec<String>,
    },
    End {
        #[serde(rename = "endedBy")]
        ended_by: String,
    },
    Status {
        from: Value,
        muted: Value,
        #[serde(rename = "cameraOff")]
        camera_off: Value,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_known_types() {
        let msg = SignalMessage::parse(r#"{"type":"offer","to":"B","offer":{"sdp":"x"}}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Offer);
        assert_eq!(msg.recipient(), Some("B"));
        assert!(msg.kind().is_relayed());

        let msg = SignalMessage::parse(r#"{"type":"users-in-room","users":[]}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::UsersInRoom);

        let msg = SignalMessage::parse(r#"{"type":"wave"}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Unknown);
    }

    #[test]
    fn rejects_frames_without_a_string_type() {
        for text in [
            "not json",
            "[\"offer\"]",
            "42",
            r#"{"to":"B"}"#,
            r#"{"type":7}"#,
            r#"{"type":null}"#,
        ] {
            assert!(
                matches!(
                    SignalMessage::parse(text),
                    Err(RelayError::MalformedMessage(_))
                ),
                "{text} should be malformed"
            );
        }
    }

    #[test]
    fn non_string_recipient_names_nobody() {
        let msg = SignalMessage::parse(r#"{"type":"ice","to":12}"#).unwrap();
        assert_eq!(msg.recipient(), None);
    }

    #[test]
    fn status_defaults_flags_to_false() {
        let msg = SignalMessage::parse(r#"{"type":"status","from":"A","muted":true}"#).unwrap();
        let frame: Value = serde_json::from_str(&msg.status_update("A").encode().unwrap()).unwrap();
        assert_eq!(
            frame,
            json!({"type": "status", "from": "A", "muted": true, "cameraOff": false})
        );

        let msg = SignalMessage::parse(r#"{"type":"status","cameraOff":null}"#).unwrap();
        assert_eq!(
            msg.status_update("Z"),
            ServerMessage::Status {
                from: json!("Z"),
                muted: json!(false),
                camera_off: json!(false),
            }
        );
    }

    #[test]
    fn composed_frames_use_wire_names() {
        let users = ServerMessage::UsersInRoom {
            users: vec!["A".into(), "B".into()],
        };
        let end = ServerMessage::End {
            ended_by: "A".into(),
        };

        assert_eq!(
            serde_json::to_value(&users).unwrap(),
            json!({"type": "users-in-room", "users": ["A", "B"]})
        );
        assert_eq!(
            serde_json::to_value(&end).unwrap(),
            json!({"type": "end", "endedBy": "A"})
        );
    }
}
