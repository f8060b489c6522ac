//! # InputBox Component
//!
//! The message composer.
//!
//! ## Responsibilities
//!
//! - Capture single-line text input (pasted newlines become spaces)
//! - Handle editing (backspace, delete, cursor movement)
//! - Emit `Submit` on Enter and clear itself, whatever happens to the text
//!   afterwards; validation belongs to core
//! - Scroll horizontally so the cursor stays visible
//!
//! ## State Management
//!
//! The buffer and cursor are internal state. `recipient` and `focused` are
//! props from the parent.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally by the bordered block
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Offset from area edge to content (border + padding)
const CONTENT_OFFSET: u16 = 2;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// Byte offset of the cursor in `buffer`
    cursor: usize,
    /// Short id of whoever Enter would send to (Prop)
    pub recipient: Option<String>,
    /// Whether keystrokes go here (Prop)
    pub focused: bool,
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            recipient: None,
            focused: true,
        }
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// Display column of the cursor within the buffer.
    fn cursor_column(&self) -> u16 {
        self.buffer[..self.cursor].width().min(u16::MAX as usize) as u16
    }

    /// Horizontal scroll keeping the cursor inside `inner_width` columns.
    fn scroll_for(&self, inner_width: u16) -> u16 {
        let column = self.cursor_column();
        if inner_width == 0 {
            return column;
        }
        column.saturating_sub(inner_width - 1)
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(HORIZONTAL_OVERHEAD);
        let scroll = self.scroll_for(inner_width);

        let title = match &self.recipient {
            Some(peer) => format!("Message {peer}"),
            None => "Select a peer (Tab, ↑/↓, Enter)".to_string(),
        };
        let border_style = if self.focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(ratatui::widgets::Padding::horizontal(1))
            .title(title);

        let input = Paragraph::new(self.buffer.as_str())
            .block(block)
            .scroll((0, scroll))
            .style(Style::default().fg(Color::Green));
        frame.render_widget(input, area);

        if self.focused {
            let x = area.x + CONTENT_OFFSET + self.cursor_column() - scroll;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y + 1));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut utf8 = [0u8; 4];
                self.insert(c.encode_utf8(&mut utf8));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                let flattened = text.replace(['\r', '\n'], " ");
                self.insert(&flattened);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.cursor > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.cursor > 0).then(|| {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.cursor < self.buffer.len()).then(|| {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => (self.cursor != 0).then(|| {
                self.cursor = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor != self.buffer.len()).then(|| {
                self.cursor = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit => {
                self.cursor = 0;
                Some(InputEvent::Submit(std::mem::take(&mut self.buffer)))
            }
            _ => None,
        }
    }
}
