//! # Application State
//!
//! Core business state for Chatline. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── connection: ConnectionState     // mirrored from the transport task
//! ├── roster: Roster                  // presence list, sorted
//! ├── conversation: Conversation      // active peer, paginator, transcript
//! ├── unread_hook: Box<dyn UnreadHook>// what to do with filtered messages
//! ├── history_trigger: ScrollDebounce // "paused at the top" timer
//! ├── status_message: String          // status bar text
//! └── notice: Option<String>          // transient inline notice
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use crate::core::config::ResolvedConfig;
use crate::core::conversation::{Conversation, NoopHook, RosterBadgeHook, UnreadHook};
use crate::core::history::ScrollDebounce;
use crate::core::presence::Roster;
use crate::core::transcript::Transcript;
use crate::net::transport::ConnectionState;

pub struct App {
    pub connection: ConnectionState,
    pub roster: Roster,
    pub conversation: Conversation,
    pub unread_hook: Box<dyn UnreadHook>,
    pub history_trigger: ScrollDebounce,
    pub status_message: String,
    /// Short-lived problem report (e.g. a failed history fetch).
    pub notice: Option<String>,
}

impl App {
    pub fn new(roster: Roster, conversation: Conversation, history_trigger: ScrollDebounce) -> Self {
        Self {
            connection: ConnectionState::Connecting,
            roster,
            conversation,
            unread_hook: Box::new(NoopHook),
            history_trigger,
            status_message: String::from("Connecting..."),
            notice: None,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        let mut app = Self::new(
            Roster::new(config.user_id.clone(), config.roster_mode),
            Conversation::new(Transcript::new(config.bottom_proximity)),
            ScrollDebounce::new(config.scroll_debounce),
        );
        if config.unread_badges {
            app.unread_hook = Box::new(RosterBadgeHook);
        }
        app
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;
    use crate::net::transport::ConnectionState;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.connection, ConnectionState::Connecting);
        assert!(app.roster.is_empty());
        assert!(app.conversation.active_peer().is_none());
        assert!(app.notice.is_none());
    }
}
