//! # History Pagination State
//!
//! Book-keeping for loading older pages of a conversation, kept apart from
//! the HTTP client so it can be driven synchronously by `update()`.
//!
//! ```text
//! begin(peer) ──► HistoryRequest { peer, offset, generation }
//!                        │  (fetched on a background task)
//!                        ▼
//! finish(request, result) ──► Applied(page) | Stale | Failed(err)
//! ```
//!
//! A request carries the generation it was issued under. `reset()` (peer
//! switch) bumps the generation, so anything still in flight for the old
//! peer comes back `Stale` and is dropped without touching the new state.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::core::types::{Message, PeerId};
use crate::net::history_client::HistoryFetchError;

/// Quiet period at the top of the transcript before an older page is requested.
pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(300);

/// A history fetch tagged with the state it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub peer: PeerId,
    pub offset: usize,
    pub generation: u64,
}

/// What happened when a fetch result came back.
#[derive(Debug)]
pub enum PageOutcome {
    /// Page accepted; the offset has already advanced by its length.
    Applied(Vec<Message>),
    /// Issued for a previous peer or generation. Discarded.
    Stale,
    /// The fetch failed; the in-flight guard has been released.
    Failed(HistoryFetchError),
}

#[derive(Debug, Default)]
pub struct Paginator {
    offset: usize,
    loading: bool,
    generation: u64,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of historical messages already materialized for the active peer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a load for `peer` at the current offset.
    ///
    /// Returns `None` while another load is in flight; the call is not queued.
    pub fn begin(&mut self, peer: &PeerId) -> Option<HistoryRequest> {
        if self.loading {
            debug!("History load for {} ignored: already loading", peer);
            return None;
        }
        self.loading = true;
        Some(HistoryRequest {
            peer: peer.clone(),
            offset: self.offset,
            generation: self.generation,
        })
    }

    /// Settle a request. `active` is the peer currently on screen.
    pub fn finish(
        &mut self,
        request: &HistoryRequest,
        active: Option<&PeerId>,
        result: Result<Vec<Message>, HistoryFetchError>,
    ) -> PageOutcome {
        if request.generation != self.generation || active != Some(&request.peer) {
            debug!(
                "Discarding stale history page for {} (generation {}, current {})",
                request.peer, request.generation, self.generation
            );
            return PageOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.offset += page.len();
                debug!(
                    "History page for {}: {} messages, offset now {}",
                    request.peer,
                    page.len(),
                    self.offset
                );
                PageOutcome::Applied(page)
            }
            Err(e) => {
                warn!("History fetch for {} failed: {}", request.peer, e);
                PageOutcome::Failed(e)
            }
        }
    }

    /// Forget everything about the previous peer.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.loading = false;
        self.generation += 1;
    }
}

/// Restartable single-shot timer for the "paused at the top" trigger.
///
/// Every scroll event at the very top re-arms the deadline, so a fetch only
/// fires once scrolling has stopped for the whole window. Scrolling away from
/// the top disarms it.
#[derive(Debug)]
pub struct ScrollDebounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl ScrollDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn on_scroll(&mut self, scroll_top: u32, now: Instant) {
        if scroll_top == 0 {
            self.deadline = Some(now + self.window);
        } else {
            self.deadline = None;
        }
    }

    /// Returns true exactly once per armed deadline, after it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for ScrollDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_DEBOUNCE)
    }
}
