//! Outbound frames and the JSON reply shape.

use serde::{Deserialize, Serialize};

/// Reply written when no route matches a request.
pub const NOT_FOUND_PAYLOAD: &str = r#"{"Status":"ERR","Info":"404 not found"}"#;

/// One outbound message on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn text(text: impl Into<String>) -> Self {
        Frame::Text(text.into())
    }

    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Frame::Binary(data.into())
    }

    /// The frame that answers an unmatched request.
    pub fn not_found() -> Self {
        Frame::Text(NOT_FOUND_PAYLOAD.to_string())
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(data) => data,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Frame::Text(_))
    }
}

/// Status/info reply used by the built-in answers and available to handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Info")]
    pub info: String,
}

impl Reply {
    pub fn ok(info: impl Into<String>) -> Self {
        Self {
            status: "OK".to_string(),
            info: info.into(),
        }
    }

    pub fn err(info: impl Into<String>) -> Self {
        Self {
            status: "ERR".to_string(),
            info: info.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_payload_matches_reply_shape() {
        let encoded = serde_json::to_string(&Reply::err("404 not found")).unwrap();
        assert_eq!(encoded, NOT_FOUND_PAYLOAD);
    }

    #[test]
    fn not_found_frame_is_text() {
        let frame = Frame::not_found();
        assert!(frame.is_text());
        assert_eq!(frame.as_bytes(), NOT_FOUND_PAYLOAD.as_bytes());
    }
}
