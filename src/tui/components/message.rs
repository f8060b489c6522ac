use std::sync::Arc;

use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::core::transcript::Measure;
use crate::core::types::{Message, PeerId};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// A stateless component that renders a single chat message.
///
/// # Styling
///
/// - **Own messages** (green): sent by the logged-in user
/// - **Peer messages** (blue): everything else
///
/// The border title carries the sender's short id and, when the server sent
/// one, the local send time.
///
/// # Height Calculation
///
/// [`calculate_height`](Self::calculate_height) predicts the rendered height
/// using `textwrap` with options that match Ratatui's `Paragraph` wrapping.
/// The transcript uses it (through [`measure`]) to do scroll anchoring
/// without rendering anything.
#[derive(Clone, Copy)]
pub struct ChatMessage<'a> {
    pub message: &'a Message,
    /// Whether `message.from` is the logged-in user
    pub is_own: bool,
}

impl<'a> ChatMessage<'a> {
    pub fn new(message: &'a Message, self_id: Option<&PeerId>) -> Self {
        Self {
            message,
            is_own: self_id == Some(&message.from),
        }
    }

    /// Calculate the height required for this message given a width.
    ///
    /// The wrapping options must match the `Ratatui` default for `Paragraph`
    /// to ensure 1:1 mapping between calculated and actual height.
    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding
            return 1;
        }

        let content = message.content.trim();
        if content.is_empty() {
            return VERTICAL_OVERHEAD;
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content, options);
        (lines.len() as u16).max(1) + VERTICAL_OVERHEAD
    }

    fn title(&self) -> String {
        match self.message.sent_at.as_deref().and_then(local_time) {
            Some(time) => format!("{} · {}", self.message.from.short(), time),
            None => self.message.from.short().to_string(),
        }
    }
}

/// Transcript measure backed by [`ChatMessage::calculate_height`].
pub fn measure() -> Measure {
    Arc::new(|message: &Message, width: u16| ChatMessage::calculate_height(message, width) as u32)
}

/// `HH:MM` in local time for an RFC 3339 timestamp.
pub fn local_time(sent_at: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(sent_at)
        .ok()
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
}

impl<'a> Widget for ChatMessage<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = if self.is_own {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Blue)
        };
        let border_style = style.add_modifier(Modifier::DIM);

        let block = Block::bordered()
            .title(self.title())
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.message.content.trim())
            .style(style)
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn msg(content: &str) -> Message {
        Message::new("a1b2c3d4-e5f6", "me", content)
    }

    #[test]
    fn calculate_height_empty_content_returns_border_height() {
        assert_eq!(ChatMessage::calculate_height(&msg("   \n\t "), 80), VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        assert_eq!(ChatMessage::calculate_height(&msg("Hello world"), 0), 1);
        assert_eq!(
            ChatMessage::calculate_height(&msg("Hello world"), HORIZONTAL_OVERHEAD),
            1
        );
    }

    #[test]
    fn calculate_height_single_line_fits() {
        assert_eq!(ChatMessage::calculate_height(&msg("Hello"), 80), 1 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_wraps_at_width_boundary() {
        // width 9 → content_width 5: "Hello" | "world"
        assert_eq!(
            ChatMessage::calculate_height(&msg("Hello world"), 9),
            2 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_breaks_long_words() {
        // width 8 → content_width 4: "abcd" | "efgh" | "ij"
        assert_eq!(
            ChatMessage::calculate_height(&msg("abcdefghij"), 8),
            3 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn measure_matches_calculate_height() {
        let m = msg("Hello world");
        assert_eq!(measure()(&m, 9), 4);
    }

    #[test]
    fn local_time_formats_or_rejects() {
        let time = local_time("2024-05-01T12:34:56.789Z").unwrap();
        assert_eq!(time.len(), 5);
        assert_eq!(&time[2..3], ":");
        assert_eq!(local_time("yesterday"), None);
    }

    #[test]
    fn own_flag_follows_self_id() {
        let m = msg("hi");
        assert!(ChatMessage::new(&m, Some(&"a1b2c3d4-e5f6".into())).is_own);
        assert!(!ChatMessage::new(&m, Some(&"me".into())).is_own);
        assert!(!ChatMessage::new(&m, None).is_own);
    }

    #[test]
    fn render_shows_sender_and_content() {
        let backend = TestBackend::new(30, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let m = msg("hello there");
        terminal
            .draw(|f| {
                f.render_widget(ChatMessage::new(&m, None), f.area());
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("a1b2c3d4"));
        assert!(text.contains("hello there"));
    }
}
