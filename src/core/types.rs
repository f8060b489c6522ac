//! Domain types shared by the core, the network layer, and the front end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a chat participant (a UUID on the reference server).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, enough to tell UUIDs apart in narrow panes.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single chat message. Immutable once created.
///
/// There is no ordering key: messages are shown in the order the server
/// emitted or returned them. `sent_at` is display-only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub from: PeerId,
    pub to: PeerId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
}

impl Message {
    pub fn new(from: impl Into<String>, to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from: PeerId::new(from),
            to: PeerId::new(to),
            content: content.into(),
            sent_at: None,
        }
    }

    /// True if `peer` is either end of this message.
    pub fn involves(&self, peer: &PeerId) -> bool {
        &self.from == peer || &self.to == peer
    }

    /// The line shown in the transcript: `from: content`.
    pub fn display_line(&self) -> String {
        format!("{}: {}", self.from.short(), self.content)
    }
}

/// A roster entry built from a presence snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub id: PeerId,
    pub is_online: bool,
    /// Preview of the last message; `None` when there has been no activity.
    pub last_message: Option<String>,
}

impl Peer {
    pub fn has_activity(&self) -> bool {
        self.last_message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Outbound chat envelope. Carries no `from`: the server stamps the sender
/// from the authenticated session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub to: PeerId,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates_uuid() {
        let id = PeerId::new("0f8fad5b-d9cb-469f-a165-70867728950e");
        assert_eq!(id.short(), "0f8fad5b");
        assert_eq!(PeerId::new("abc").short(), "abc");
    }

    #[test]
    fn test_involves_checks_both_ends() {
        let msg = Message::new("z", "w", "hi");
        assert!(msg.involves(&"z".into()));
        assert!(msg.involves(&"w".into()));
        assert!(!msg.involves(&"q".into()));
    }

    #[test]
    fn test_empty_last_message_is_no_activity() {
        let mut peer = Peer {
            id: "a".into(),
            is_online: true,
            last_message: Some(String::new()),
        };
        assert!(!peer.has_activity());
        peer.last_message = Some("hey".into());
        assert!(peer.has_activity());
    }

    #[test]
    fn test_outbound_has_no_from() {
        let out = OutboundMessage {
            to: "w".into(),
            content: "hello".into(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json, serde_json::json!({"to": "w", "content": "hello"}));
    }
}
