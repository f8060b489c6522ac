//! # Wire Protocol
//!
//! Inbound frames are JSON text discriminated by a `type` field:
//!
//! ```text
//! {"type":"user_list","users":[{"UserUUID":"..","IsOnline":true,"LastMessage":""}]}
//! {"from":"..","to":"..","content":"..","sent_at":".."}      (anything else)
//! ```
//!
//! Outbound frames are just `{"to":"..","content":".."}`. There is no `type`
//! and no `from`: the server fills in the sender from the authenticated
//! session. The two directions are deliberately not symmetric.

use std::fmt;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::core::action::Action;
use crate::core::types::{Message, OutboundMessage, Peer, PeerId};

pub const USER_LIST_TYPE: &str = "user_list";

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    UserList(Vec<Peer>),
    Chat(Message),
}

#[derive(Debug)]
pub enum FrameParseError {
    /// Not JSON at all.
    Json(String),
    /// JSON, but not a shape we know.
    Shape(String),
}

impl fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameParseError::Json(msg) => write!(f, "invalid JSON frame: {msg}"),
            FrameParseError::Shape(msg) => write!(f, "unrecognized frame: {msg}"),
        }
    }
}

impl std::error::Error for FrameParseError {}

/// Presence entry as the server encodes it (Go field names, no tags).
#[derive(Deserialize, Debug)]
struct WirePresence {
    #[serde(rename = "UserUUID")]
    user_uuid: String,
    #[serde(rename = "IsOnline", default)]
    is_online: bool,
    #[serde(rename = "LastMessage", default)]
    last_message: Option<String>,
}

impl From<WirePresence> for Peer {
    fn from(wire: WirePresence) -> Self {
        Peer {
            id: PeerId(wire.user_uuid),
            is_online: wire.is_online,
            last_message: wire.last_message.filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Deserialize, Debug)]
struct UserListFrame {
    #[serde(default)]
    users: Option<Vec<WirePresence>>,
}

pub fn parse_frame(text: &str) -> Result<Frame, FrameParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| FrameParseError::Json(e.to_string()))?;

    let is_user_list = value.get("type").and_then(Value::as_str) == Some(USER_LIST_TYPE);
    if is_user_list {
        let frame: UserListFrame =
            serde_json::from_value(value).map_err(|e| FrameParseError::Shape(e.to_string()))?;
        let peers = frame
            .users
            .unwrap_or_default()
            .into_iter()
            .map(Peer::from)
            .collect();
        return Ok(Frame::UserList(peers));
    }

    let message: Message =
        serde_json::from_value(value).map_err(|e| FrameParseError::Shape(e.to_string()))?;
    Ok(Frame::Chat(message))
}

/// Classify a raw frame and turn it into the action the core should apply.
/// Malformed frames are logged and dropped.
pub fn route(text: &str) -> Option<Action> {
    match parse_frame(text) {
        Ok(Frame::UserList(peers)) => Some(Action::RosterSnapshot(peers)),
        Ok(Frame::Chat(message)) => Some(Action::MessageReceived(message)),
        Err(e) => {
            warn!("Dropping inbound frame: {} (frame: {:.120})", e, text);
            None
        }
    }
}

pub fn encode_outbound(message: &OutboundMessage) -> String {
    // Two string fields; serialization cannot fail.
    serde_json::to_string(message).unwrap_or_default()
}
