//! JSON frames exchanged with the conversational server.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A displayed field of a server frame.
///
/// Servers are not strict about these: any JSON value is accepted. Strings
/// display bare, everything else in compact JSON. A missing field displays
/// as the empty string.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FrameText(pub Value);

impl Default for FrameText {
    fn default() -> Self {
        Self(Value::String(String::new()))
    }
}

impl From<&str> for FrameText {
    fn from(text: &str) -> Self {
        Self(Value::String(text.to_owned()))
    }
}

impl fmt::Display for FrameText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            other => write!(f, "{other}"),
        }
    }
}

/// One entry of a `history` frame.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    #[serde(default)]
    pub content: FrameText,
}

/// A frame sent by the server, discriminated by its `type` field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The server rejected something.
    Error {
        #[serde(default)]
        message: FrameText,
    },
    /// Initial conversation state. Only logged; the payload is opaque here.
    State,
    /// Prior messages of the conversation, oldest first.
    History {
        #[serde(default)]
        messages: Option<Vec<HistoryEntry>>,
    },
    /// A chat line from some participant.
    Message {
        sender: String,
        #[serde(default)]
        content: FrameText,
    },
    /// The server resumed an interrupted conversation.
    Resumed {
        #[serde(default)]
        message: FrameText,
    },
    /// The conversation is over.
    Completed {
        #[serde(default)]
        message: FrameText,
        #[serde(default)]
        close_connection: bool,
        #[serde(default)]
        close_reason: FrameText,
    },
    /// The server accepted a reconnection.
    ReconnectSuccess {
        #[serde(default)]
        message: FrameText,
    },
    /// Any well-formed JSON this client does not know. Kept verbatim.
    #[serde(skip)]
    Unrecognized(Value),
}

impl ServerMessage {
    const KNOWN_TYPES: [&'static str; 7] = [
        "error",
        "state",
        "history",
        "message",
        "resumed",
        "completed",
        "reconnect_success",
    ];

    /// Decode a text frame.
    ///
    /// Fails only when the frame is not JSON or a known `type` carries
    /// malformed fields. Valid JSON of any other shape decodes to
    /// [`ServerMessage::Unrecognized`].
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let known = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|kind| Self::KNOWN_TYPES.contains(&kind));

        if known {
            serde_json::from_value(value)
        } else {
            Ok(Self::Unrecognized(value))
        }
    }
}

/// Control frames the client sends on its own initiative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Sent right after a reconnection opens.
    ReconnectConfirm,
}

/// A frame sent by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Control(ControlMessage),
    /// User text, serialized as `{"content": ...}`.
    Chat { content: String },
}

impl ClientMessage {
    /// The reconnect confirmation frame.
    pub fn reconnect_confirm() -> Self {
        Self::Control(ControlMessage::ReconnectConfirm)
    }

    /// A user chat frame.
    pub fn chat(content: impl Into<String>) -> Self {
        Self::Chat {
            content: content.into(),
        }
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
