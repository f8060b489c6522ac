//! # Transcript
//!
//! The ordered message surface of the active conversation, written from
//! both ends:
//!
//! ```text
//!   prepend_page()  ──►  ┌──────────────┐  ▲ older history
//!                        │   entries    │
//!                        │  (VecDeque)  │
//!   append()        ──►  └──────────────┘  ▼ live messages
//! ```
//!
//! It also owns the scroll geometry (content height, viewport height, scroll
//! offset from the top) so the anchor rules can be enforced without knowing
//! anything about the renderer. Heights come from a pluggable [`Measure`];
//! units are whatever the renderer uses (rows in the terminal).

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::types::Message;

/// Height of one rendered message at a given content width.
pub type Measure = Arc<dyn Fn(&Message, u16) -> u32 + Send + Sync>;

/// Fallback measure: one unit per source line.
pub fn line_measure() -> Measure {
    Arc::new(|msg: &Message, _width: u16| msg.display_line().lines().count().max(1) as u32)
}

pub struct Transcript {
    entries: VecDeque<Message>,
    heights: VecDeque<u32>,
    measure: Measure,
    width: u16,
    scroll_top: u32,
    viewport_height: u32,
    /// Auto-scroll on append only when this close to the bottom.
    bottom_proximity: u32,
}

impl Transcript {
    pub fn new(bottom_proximity: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            heights: VecDeque::new(),
            measure: line_measure(),
            width: 0,
            scroll_top: 0,
            viewport_height: 0,
            bottom_proximity,
        }
    }

    pub fn set_measure(&mut self, measure: Measure) {
        let was_at_bottom = self.is_at_bottom();
        self.measure = measure;
        self.remeasure();
        if was_at_bottom {
            self.scroll_to_bottom();
        } else {
            self.clamp();
        }
    }

    /// Re-measure everything for a new content width. Keeps the view pinned
    /// to the bottom if it was there.
    pub fn set_width(&mut self, width: u16) {
        if width == self.width {
            return;
        }
        let was_at_bottom = self.is_at_bottom();
        self.width = width;
        self.remeasure();
        if was_at_bottom {
            self.scroll_to_bottom();
        } else {
            self.clamp();
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if height == self.viewport_height {
            return;
        }
        let was_at_bottom = self.is_at_bottom();
        self.viewport_height = height;
        if was_at_bottom {
            self.scroll_to_bottom();
        } else {
            self.clamp();
        }
    }

    fn remeasure(&mut self) {
        let measure = self.measure.clone();
        let width = self.width;
        self.heights = self.entries.iter().map(|m| measure(m, width)).collect();
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn heights(&self) -> impl Iterator<Item = u32> + '_ {
        self.heights.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn content_height(&self) -> u32 {
        self.heights.iter().sum()
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    pub fn max_scroll(&self) -> u32 {
        self.content_height().saturating_sub(self.viewport_height)
    }

    pub fn distance_from_bottom(&self) -> u32 {
        self.max_scroll().saturating_sub(self.scroll_top)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.distance_from_bottom() == 0
    }

    /// Append a live message at the bottom.
    ///
    /// Returns true if the view followed it to the bottom, which only happens
    /// when the viewport was within `bottom_proximity` before the append.
    pub fn append(&mut self, message: Message) -> bool {
        let follow = self.distance_from_bottom() <= self.bottom_proximity;
        self.heights.push_back((self.measure)(&message, self.width));
        self.entries.push_back(message);
        if follow {
            self.scroll_to_bottom();
        }
        follow
    }

    /// Insert a page of older history above everything already shown.
    ///
    /// Each message lands above the previous one, so the page reads bottom-up
    /// in array order. The scroll offset grows by exactly the inserted height
    /// (bounded by the scrollable range), so whatever the user was looking at
    /// stays put. Returns the inserted height.
    pub fn prepend_page(&mut self, page: Vec<Message>) -> u32 {
        let old_height = self.content_height();
        for message in page {
            self.heights.push_front((self.measure)(&message, self.width));
            self.entries.push_front(message);
        }
        let delta = self.content_height() - old_height;
        self.scroll_top = self.scroll_top.saturating_add(delta);
        self.clamp();
        delta
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.heights.clear();
        self.scroll_top = 0;
    }

    pub fn scroll_up(&mut self, amount: u32) -> u32 {
        self.scroll_top = self.scroll_top.saturating_sub(amount);
        self.scroll_top
    }

    pub fn scroll_down(&mut self, amount: u32) -> u32 {
        self.scroll_top = self.scroll_top.saturating_add(amount);
        self.clamp();
        self.scroll_top
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll();
    }

    fn clamp(&mut self) {
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_BOTTOM_PROXIMITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> Message {
        Message::new("x", "me", content)
    }

    /// Transcript with `n` one-row messages and a 10-row viewport.
    fn tall(n: usize) -> Transcript {
        let mut t = Transcript::new(3);
        t.set_viewport_height(10);
        for i in 0..n {
            t.append(msg(&format!("live {i}")));
        }
        t
    }

    fn contents(t: &Transcript) -> Vec<String> {
        t.messages().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn test_set_measure_keeps_bottom_pin() {
        let mut t = tall(20);
        assert!(t.is_at_bottom());
        t.set_measure(Arc::new(|_: &Message, _: u16| 3));
        assert_eq!(t.content_height(), 60);
        assert!(t.is_at_bottom());

        // Away from the bottom: clamp only
        t.scroll_up(100);
        t.set_measure(line_measure());
        assert_eq!(t.scroll_top(), 0);
        assert!(!t.is_at_bottom());
    }

    #[test]
    fn test_prepend_reverses_array_order() {
        let mut t = Transcript::new(3);
        t.prepend_page(vec![msg("newest"), msg("middle"), msg("oldest")]);
        assert_eq!(contents(&t), vec!["oldest", "middle", "newest"]);
    }

    #[test]
    fn test_prepends_are_monotonic() {
        let mut t = Transcript::new(3);
        t.prepend_page(vec![msg("p1-a"), msg("p1-b")]);
        t.prepend_page(vec![msg("p2-a"), msg("p2-b")]);
        assert_eq!(contents(&t), vec!["p2-b", "p2-a", "p1-b", "p1-a"]);
    }

    #[test]
    fn test_prepend_shifts_scroll_by_inserted_height() {
        let mut t = tall(30);
        t.scroll_up(t.scroll_top()); // user is at the very top
        assert_eq!(t.scroll_top(), 0);

        let multi_line = Message::new("x", "me", "a\nb\nc");
        let delta = t.prepend_page(vec![msg("old"), multi_line]);
        assert_eq!(delta, 4);
        assert_eq!(t.scroll_top(), 4);
    }

    #[test]
    fn test_anchor_holds_mid_scroll() {
        let mut t = tall(30);
        t.scroll_up(8);
        let before = t.scroll_top();
        t.prepend_page(vec![msg("a"), msg("b")]);
        assert_eq!(t.scroll_top(), before + 2);
    }

    #[test]
    fn test_anchor_holds_after_live_append_during_fetch() {
        let mut t = tall(30);
        t.scroll_up(t.scroll_top());
        // Live message arrives while the page is in flight; user is far from bottom
        assert!(!t.append(msg("live late")));
        assert_eq!(t.scroll_top(), 0);
        t.prepend_page(vec![msg("old 1"), msg("old 2"), msg("old 3")]);
        assert_eq!(t.scroll_top(), 3);
        assert_eq!(contents(&t).last().unwrap(), "live late");
    }

    #[test]
    fn test_append_follows_only_near_bottom() {
        let mut t = tall(30);
        assert!(t.is_at_bottom());
        assert!(t.append(msg("follows")));
        assert!(t.is_at_bottom());

        t.scroll_up(3);
        assert!(t.append(msg("still within threshold")));
        assert!(t.is_at_bottom());

        t.scroll_up(4);
        let pinned = t.scroll_top();
        assert!(!t.append(msg("user reading above")));
        assert_eq!(t.scroll_top(), pinned);
    }

    #[test]
    fn test_initial_page_lands_at_bottom() {
        let mut t = Transcript::new(3);
        t.set_viewport_height(5);
        let page: Vec<Message> = (0..10).map(|i| msg(&format!("{i}"))).collect();
        t.prepend_page(page);
        assert!(t.is_at_bottom());
        assert_eq!(t.scroll_top(), 5);
    }

    #[test]
    fn test_short_content_clamps_to_zero() {
        let mut t = Transcript::new(3);
        t.set_viewport_height(20);
        t.prepend_page(vec![msg("only one")]);
        assert_eq!(t.scroll_top(), 0);
    }

    #[test]
    fn test_clear_resets_geometry() {
        let mut t = tall(30);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.content_height(), 0);
        assert_eq!(t.scroll_top(), 0);
    }

    #[test]
    fn test_custom_measure_drives_heights() {
        let mut t = tall(2);
        t.set_measure(Arc::new(|_m: &Message, _w: u16| 3));
        assert_eq!(t.content_height(), 6);
    }
}
