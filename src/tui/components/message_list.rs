//! # MessageList Component
//!
//! Scrollable view of the active conversation.
//!
//! ## Responsibilities
//!
//! - Display the transcript, oldest at the top
//! - Feed the transcript its geometry (content width, viewport height) so
//!   anchoring decisions in core use the same numbers the screen does
//! - Render only the visible slice, using a prefix-sum layout cache
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the `Transcript` (props).
//! The scroll offset itself is owned by the transcript; the `ScrollViewState`
//! is just synced to it every frame. The first render also installs the
//! `ChatMessage` measure on the transcript, so heights always match what is
//! drawn.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::transcript::Transcript;
use crate::core::types::PeerId;
use crate::tui::component::Component;
use crate::tui::components::message::{self, ChatMessage};

/// Must be persisted in the parent TuiState.
#[derive(Default)]
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// Set once the transcript measures with `message::measure()`.
    measure_installed: bool,
}

impl MessageListState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub transcript: &'a mut Transcript,
    pub self_id: Option<&'a PeerId>,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        transcript: &'a mut Transcript,
        self_id: Option<&'a PeerId>,
    ) -> Self {
        Self {
            state,
            transcript,
            self_id,
        }
    }
}

fn to_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        if !self.state.measure_installed {
            self.transcript.set_measure(message::measure());
            self.state.measure_installed = true;
        }

        // 1. Geometry first: may remeasure and re-pin the scroll offset
        self.transcript.set_width(content_width);
        self.transcript.set_viewport_height(area.height as u32);

        let layout = &mut self.state.layout;
        layout.rebuild(self.transcript.heights());

        let scroll_top = self.transcript.scroll_top();
        let visible = layout.visible_range(scroll_top, area.height as u32);
        let canvas_height = to_u16(self.transcript.content_height());

        // 2. Render the visible slice into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset = layout.top_of(visible.start);
        for (message, height) in self
            .transcript
            .messages()
            .zip(self.transcript.heights())
            .skip(visible.start)
            .take(visible.len())
        {
            let rect = Rect::new(0, to_u16(y_offset), content_width, to_u16(height));
            scroll_view.render_widget(ChatMessage::new(message, self.self_id), rect);
            y_offset += height;
        }

        self.state.scroll_state.set_offset(Position {
            x: 0,
            y: to_u16(scroll_top),
        });
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Prefix sums of the transcript's heights, rebuilt each frame.
#[derive(Debug, Default)]
pub struct LayoutCache {
    pub prefix_heights: Vec<u32>,
}

impl LayoutCache {
    pub fn rebuild(&mut self, heights: impl Iterator<Item = u32>) {
        self.prefix_heights.clear();
        let mut acc = 0u32;
        for h in heights {
            acc += h;
            self.prefix_heights.push(acc);
        }
    }

    /// Content y where item `index` starts.
    pub fn top_of(&self, index: usize) -> u32 {
        match index {
            0 => 0,
            i => self.prefix_heights.get(i - 1).copied().unwrap_or(0),
        }
    }

    /// Items intersecting the viewport, plus half a viewport of slack on
    /// each side.
    pub fn visible_range(&self, scroll_offset: u32, viewport_height: u32) -> Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end.max(start)
    }
}
