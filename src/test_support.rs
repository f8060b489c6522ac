//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::conversation::Conversation;
use crate::core::history::ScrollDebounce;
use crate::core::presence::{Roster, RosterMode};
use crate::core::state::App;
use crate::core::transcript::Transcript;
use crate::core::types::{Message, PeerId};
use crate::net::history_client::{HistoryFetchError, HistorySource};

/// Serves canned pages keyed by `(peer, offset)`. Missing keys are empty pages.
#[derive(Default)]
pub struct FakeHistorySource {
    pages: HashMap<(PeerId, usize), Vec<Message>>,
    pub calls: Mutex<Vec<(PeerId, usize)>>,
}

impl FakeHistorySource {
    pub fn with_page(mut self, peer: &str, offset: usize, page: Vec<Message>) -> Self {
        self.pages.insert((PeerId::new(peer), offset), page);
        self
    }
}

#[async_trait]
impl HistorySource for FakeHistorySource {
    async fn fetch_page(
        &self,
        peer: &PeerId,
        offset: usize,
    ) -> Result<Vec<Message>, HistoryFetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((peer.clone(), offset));
        }
        Ok(self
            .pages
            .get(&(peer.clone(), offset))
            .cloned()
            .unwrap_or_default())
    }
}

/// `n` messages from `peer` to "me", newest first as the server sends them.
pub fn page_from(peer: &str, n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| Message::new(peer, "me", format!("m{}", n - i)))
        .collect()
}

/// Creates a test App for user "me" with default settings.
pub fn test_app() -> App {
    App::new(
        Roster::new(Some(PeerId::new("me")), RosterMode::Replace),
        Conversation::new(Transcript::default()),
        ScrollDebounce::default(),
    )
}
