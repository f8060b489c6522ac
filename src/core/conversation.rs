//! # Conversation View
//!
//! Owns everything about the conversation currently on screen: which peer
//! is active, the pagination state for that peer, and the transcript.
//!
//! ```text
//! Conversation
//! ├── active_peer: Option<PeerId>
//! ├── paginator: Paginator     // offset, in-flight guard, generation
//! └── transcript: Transcript   // messages + scroll geometry
//! ```
//!
//! Live messages only ever append; history pages only ever prepend. The
//! pagination offset is advanced by history results alone, so live traffic
//! can never cause a page to be skipped or fetched twice.

use std::fmt;

use log::debug;

use crate::core::history::{HistoryRequest, PageOutcome, Paginator};
use crate::core::presence::Roster;
use crate::core::transcript::Transcript;
use crate::core::types::{Message, OutboundMessage, PeerId};
use crate::net::history_client::HistoryFetchError;

/// Why an outbound message was not built. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyContent,
    NoActivePeer,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyContent => write!(f, "message is empty"),
            ValidationError::NoActivePeer => write!(f, "no conversation selected"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of routing a live message to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming {
    /// Shown. `followed` is true if the view auto-scrolled to it.
    Rendered { followed: bool },
    /// Not part of the active conversation.
    Filtered,
}

/// Result of settling a history fetch against the view.
#[derive(Debug)]
pub enum PageApplied {
    Rendered { count: usize, inserted_height: u32 },
    Stale,
    Failed(HistoryFetchError),
}

/// Called for live messages that are filtered out of the active view.
pub trait UnreadHook: Send {
    fn on_filtered(&self, message: &Message, roster: &mut Roster);
}

/// Default: filtered messages are silently dropped from view.
pub struct NoopHook;

impl UnreadHook for NoopHook {
    fn on_filtered(&self, _message: &Message, _roster: &mut Roster) {}
}

/// Flags the other party of a filtered message in the roster.
pub struct RosterBadgeHook;

impl UnreadHook for RosterBadgeHook {
    fn on_filtered(&self, message: &Message, roster: &mut Roster) {
        let counterpart = if roster.self_id() == Some(&message.from) {
            message.to.clone()
        } else {
            message.from.clone()
        };
        roster.mark_unread(&counterpart);
    }
}

pub struct Conversation {
    active_peer: Option<PeerId>,
    paginator: Paginator,
    pub transcript: Transcript,
}

impl Conversation {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            active_peer: None,
            paginator: Paginator::new(),
            transcript,
        }
    }

    pub fn active_peer(&self) -> Option<&PeerId> {
        self.active_peer.as_ref()
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Make `peer` the active conversation and request its newest page.
    ///
    /// Anything still in flight for the previous peer becomes stale.
    pub fn switch_to(&mut self, peer: PeerId) -> Option<HistoryRequest> {
        debug!("Switching conversation to {}", peer);
        self.paginator.reset();
        self.transcript.clear();
        let request = self.paginator.begin(&peer);
        self.active_peer = Some(peer);
        request
    }

    /// Request the next older page for the active peer, unless one is in flight.
    pub fn load_older(&mut self) -> Option<HistoryRequest> {
        let peer = self.active_peer.as_ref()?;
        self.paginator.begin(peer)
    }

    pub fn apply_page(
        &mut self,
        request: &HistoryRequest,
        result: Result<Vec<Message>, HistoryFetchError>,
    ) -> PageApplied {
        match self
            .paginator
            .finish(request, self.active_peer.as_ref(), result)
        {
            PageOutcome::Applied(page) => {
                let count = page.len();
                let inserted_height = self.transcript.prepend_page(page);
                PageApplied::Rendered {
                    count,
                    inserted_height,
                }
            }
            PageOutcome::Stale => PageApplied::Stale,
            PageOutcome::Failed(e) => PageApplied::Failed(e),
        }
    }

    pub fn handle_incoming(&mut self, message: Message) -> Incoming {
        match &self.active_peer {
            Some(active) if message.involves(active) => {
                let followed = self.transcript.append(message);
                Incoming::Rendered { followed }
            }
            _ => Incoming::Filtered,
        }
    }

    /// Build the outbound envelope for `text`.
    pub fn compose(&self, text: &str) -> Result<OutboundMessage, ValidationError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        let to = self
            .active_peer
            .clone()
            .ok_or(ValidationError::NoActivePeer)?;
        Ok(OutboundMessage {
            to,
            content: content.to_string(),
        })
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(Transcript::default())
    }
}
