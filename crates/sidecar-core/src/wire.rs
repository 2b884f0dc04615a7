use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 256 * 1024;

/// The two verbs of the sidecar protocol. `request` asks the relay to
/// rebroadcast a category's current contents; `info` carries the contents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Request,
    Info,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Request => "request",
            Action::Info => "info",
        }
    }
}

/// The wire unit exchanged with the relay, identical in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub category: String,
    pub action: Action,
    pub message: Value,
}

impl Envelope {
    pub fn new(category: impl Into<String>, action: Action, message: Value) -> Self {
        Self {
            category: category.into(),
            action,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame exceeds max size: {size} > {max}")]
    OversizedFrame { size: usize, max: usize },
    #[error("frame encode failed: {0}")]
    Encode(String),
    #[error("frame decode failed: {0}")]
    Decode(String),
}

/// Serialize an envelope into a single newline-free JSON text frame.
pub fn encode_frame(envelope: &Envelope, max_frame_bytes: usize) -> Result<String, FrameError> {
    let encoded =
        serde_json::to_string(envelope).map_err(|err| FrameError::Encode(err.to_string()))?;
    if encoded.len() > max_frame_bytes {
        return Err(FrameError::OversizedFrame {
            size: encoded.len(),
            max: max_frame_bytes,
        });
    }
    Ok(encoded)
}

/// Parse a raw inbound text frame. Missing or mistyped fields surface as
/// `Decode`; the caller drops the frame and keeps the connection open.
pub fn decode_frame(text: &str, max_frame_bytes: usize) -> Result<Envelope, FrameError> {
    let raw = text.trim();
    if raw.len() > max_frame_bytes {
        return Err(FrameError::OversizedFrame {
            size: raw.len(),
            max: max_frame_bytes,
        });
    }
    serde_json::from_str(raw).map_err(|err| FrameError::Decode(err.to_string()))
}
