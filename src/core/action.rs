//! # Actions
//!
//! Everything that can happen in Chatline becomes an `Action`.
//! User picks a peer? That's `Action::SelectPeer(id)`.
//! A frame arrives? The router turns it into `Action::MessageReceived(msg)`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing I/O the caller must perform.
//! No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! This makes everything testable without sockets or a terminal.

use std::time::Instant;

use log::{debug, info};

use crate::core::conversation::{Incoming, PageApplied};
use crate::core::history::HistoryRequest;
use crate::core::state::App;
use crate::core::types::{Message, OutboundMessage, Peer, PeerId};
use crate::net::history_client::HistoryFetchError;
use crate::net::transport::ConnectionState;

#[derive(Debug)]
pub enum Action {
    /// Transport moved to a new connection state.
    ConnectionChanged(ConnectionState),
    /// A `user_list` frame.
    RosterSnapshot(Vec<Peer>),
    /// A live chat frame.
    MessageReceived(Message),
    /// User opened a conversation.
    SelectPeer(PeerId),
    /// Request the next older page now.
    LoadOlder,
    /// A history fetch settled.
    HistoryLoaded {
        request: HistoryRequest,
        result: Result<Vec<Message>, HistoryFetchError>,
    },
    /// User pressed Enter in the input box.
    Submit(String),
    ScrollUp { rows: u32, at: Instant },
    ScrollDown { rows: u32, at: Instant },
    ScrollToBottom,
    /// Periodic clock tick from the event loop (drives the scroll debounce).
    Tick(Instant),
    Quit,
}

/// I/O requested by `update()`.
#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    FetchHistory(HistoryRequest),
    Send(OutboundMessage),
    Quit,
}

fn fetch(request: Option<HistoryRequest>) -> Effect {
    request.map_or(Effect::None, Effect::FetchHistory)
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::ConnectionChanged(state) => {
            info!("Connection state: {:?}", state);
            app.connection = state;
            app.status_message = match state {
                ConnectionState::Open => String::from("Connected"),
                ConnectionState::Connecting => String::from("Connecting..."),
                ConnectionState::Reconnecting => String::from("Connection lost, retrying..."),
            };
            Effect::None
        }
        Action::RosterSnapshot(peers) => {
            app.roster.apply_snapshot(peers);
            Effect::None
        }
        Action::MessageReceived(message) => {
            let preview = message.clone();
            match app.conversation.handle_incoming(message) {
                Incoming::Rendered { followed } => {
                    debug!("Rendered live message from {} (followed: {})", preview.from, followed);
                }
                Incoming::Filtered => {
                    debug!("Live message {} -> {} outside active view", preview.from, preview.to);
                    app.unread_hook.on_filtered(&preview, &mut app.roster);
                }
            }
            Effect::None
        }
        Action::SelectPeer(peer) => {
            app.roster.clear_unread(&peer);
            app.history_trigger.cancel();
            app.notice = None;
            fetch(app.conversation.switch_to(peer))
        }
        Action::LoadOlder => fetch(app.conversation.load_older()),
        Action::HistoryLoaded { request, result } => {
            match app.conversation.apply_page(&request, result) {
                PageApplied::Rendered {
                    count,
                    inserted_height,
                } => {
                    debug!("Prepended {} messages ({} rows)", count, inserted_height);
                    app.notice = None;
                }
                PageApplied::Stale => {}
                PageApplied::Failed(e) => {
                    app.notice = Some(format!("Couldn't load history: {e}"));
                }
            }
            Effect::None
        }
        Action::Submit(text) => match app.conversation.compose(&text) {
            Ok(outbound) => Effect::Send(outbound),
            Err(e) => {
                debug!("Send suppressed: {}", e);
                Effect::None
            }
        },
        Action::ScrollUp { rows, at } => {
            let top = app.conversation.transcript.scroll_up(rows);
            app.history_trigger.on_scroll(top, at);
            Effect::None
        }
        Action::ScrollDown { rows, at } => {
            let top = app.conversation.transcript.scroll_down(rows);
            app.history_trigger.on_scroll(top, at);
            Effect::None
        }
        Action::ScrollToBottom => {
            app.conversation.transcript.scroll_to_bottom();
            app.history_trigger.cancel();
            Effect::None
        }
        Action::Tick(now) => {
            if app.history_trigger.fire(now) {
                fetch(app.conversation.load_older())
            } else {
                Effect::None
            }
        }
        Action::Quit => Effect::Quit,
    }
}
