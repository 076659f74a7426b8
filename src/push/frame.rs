//! Text codec for Socket.IO v5 packets carried over Engine.IO v4 WebSocket
//! frames. Only the default namespace and text packets are supported, which is
//! all the conversion service uses.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Handshake {
    pub sid: String,
    #[serde(rename = "pingInterval", default)]
    pub ping_interval_ms: u64,
    #[serde(rename = "pingTimeout", default)]
    pub ping_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connected,
    Disconnected,
    Event { name: String, payload: Value },
    ConnectError(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unsupported engine.io packet type '{0}'")]
    UnknownPacket(char),
    #[error("unsupported socket.io packet type '{0}'")]
    UnknownSocketPacket(char),
    #[error("invalid json in frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed event packet: {0}")]
    EventShape(&'static str),
}

/// Client request to open the default namespace.
pub const CONNECT: &str = "40";
/// Engine.IO heartbeat reply.
pub const PONG: &str = "3";

pub fn decode(text: &str) -> Result<Frame, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(Frame::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest),
        '6' => Ok(Frame::Noop),
        other => Err(FrameError::UnknownPacket(other)),
    }
}

fn decode_socket_packet(text: &str) -> Result<Frame, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let body = skip_namespace_and_ack(chars.as_str());
    match kind {
        '0' => Ok(Frame::Connected),
        '1' => Ok(Frame::Disconnected),
        '2' => decode_event(body),
        '4' => {
            let reason = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| body.to_string());
            Ok(Frame::ConnectError(reason))
        }
        other => Err(FrameError::UnknownSocketPacket(other)),
    }
}

fn skip_namespace_and_ack(body: &str) -> &str {
    let body = if body.starts_with('/') {
        body.split_once(',').map(|(_, rest)| rest).unwrap_or("")
    } else {
        body
    };
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(body: &str) -> Result<Frame, FrameError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(mut items) = value else {
        return Err(FrameError::EventShape("event body is not an array"));
    };
    if items.is_empty() {
        return Err(FrameError::EventShape("event array is empty"));
    }
    let Value::String(name) = items.remove(0) else {
        return Err(FrameError::EventShape("event name is not a string"));
    };
    let payload = if items.is_empty() {
        Value::Null
    } else {
        items.remove(0)
    };
    Ok(Frame::Event { name, payload })
}

pub fn encode_event(name: &str, payload: &Value) -> String {
    let body = Value::Array(vec![Value::String(name.to_string()), payload.clone()]);
    format!("42{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_handshake() {
        let frame = decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
            .unwrap();
        assert_eq!(
            frame,
            Frame::Open(Handshake {
                sid: "abc".to_string(),
                ping_interval_ms: 25000,
                ping_timeout_ms: 20000,
            })
        );
    }

    #[test]
    fn decodes_heartbeat_and_namespace_packets() {
        assert_eq!(decode("2").unwrap(), Frame::Ping);
        assert_eq!(decode("40").unwrap(), Frame::Connected);
        assert_eq!(decode(r#"40{"sid":"xyz"}"#).unwrap(), Frame::Connected);
        assert_eq!(decode("41").unwrap(), Frame::Disconnected);
    }

    #[test]
    fn decodes_progress_event() {
        let frame = decode(
            r#"42["conversion_progress",{"status":"converting","progress":65,"message":"Page 3"}]"#,
        )
        .unwrap();
        let Frame::Event { name, payload } = frame else {
            panic!("expected event");
        };
        assert_eq!(name, "conversion_progress");
        assert_eq!(payload["progress"], json!(65));
    }

    #[test]
    fn event_with_ack_id_and_namespace_is_tolerated() {
        let frame = decode(r#"42/,7["joined",{"conversion_id":"c1"}]"#).unwrap();
        assert!(matches!(frame, Frame::Event { ref name, .. } if name == "joined"));
    }

    #[test]
    fn connect_error_exposes_reason() {
        assert_eq!(
            decode(r#"44{"message":"Not authorized"}"#).unwrap(),
            Frame::ConnectError("Not authorized".to_string())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode(""), Err(FrameError::Empty)));
        assert!(matches!(decode("9"), Err(FrameError::UnknownPacket('9'))));
        assert!(matches!(decode("42{}"), Err(FrameError::EventShape(_))));
    }

    #[test]
    fn encodes_join_event() {
        assert_eq!(
            encode_event("join_conversion", &json!({"conversion_id": "c-9"})),
            r#"42["join_conversion",{"conversion_id":"c-9"}]"#
        );
    }
}
