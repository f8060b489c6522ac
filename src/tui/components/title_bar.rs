//! # TitleBar Component
//!
//! Top status bar: connection state, the open conversation, status text and
//! notices.
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar {
//!     connection: app.connection,
//!     active_peer: app.conversation.active_peer().map(|p| p.short().to_string()),
//!     status_message: app.status_message.clone(),
//!     notice: app.notice.clone(),
//!     has_unseen_content: !app.conversation.transcript.is_at_bottom(),
//! };
//! title_bar.render(frame, title_area);
//! ```
//!
//! Layout: `Chatline [online] | with a1b2c3d4 | Connected | ↓ New | <notice>`.
//! Segments drop out when empty; the notice is rendered last, in red.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::net::transport::ConnectionState;
use crate::tui::component::Component;

pub struct TitleBar {
    pub connection: ConnectionState,
    /// Short id of the open conversation, if any
    pub active_peer: Option<String>,
    pub status_message: String,
    /// Transient problem report (failed history fetch, dropped send)
    pub notice: Option<String>,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

fn connection_style(state: ConnectionState) -> Style {
    match state {
        ConnectionState::Open => Style::default().fg(Color::Green),
        ConnectionState::Connecting => Style::default().fg(Color::Yellow),
        ConnectionState::Reconnecting => Style::default().fg(Color::Red),
    }
}

impl TitleBar {
    fn spans(&self) -> Vec<Span<'_>> {
        let separator = || Span::raw(" | ");
        let mut spans = vec![
            Span::styled("Chatline ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("[{}]", self.connection.label()),
                connection_style(self.connection),
            ),
        ];
        if let Some(peer) = &self.active_peer {
            spans.push(separator());
            spans.push(Span::raw(format!("with {peer}")));
        }
        if !self.status_message.is_empty() {
            spans.push(separator());
            spans.push(Span::raw(self.status_message.as_str()));
        }
        if self.has_unseen_content {
            spans.push(separator());
            spans.push(Span::raw("↓ New"));
        }
        if let Some(notice) = &self.notice {
            spans.push(separator());
            spans.push(Span::styled(notice.as_str(), Style::default().fg(Color::Red)));
        }
        spans
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Line::from(self.spans()), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_text(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(100, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_title_bar_full() {
        let mut title_bar = TitleBar {
            connection: ConnectionState::Open,
            active_peer: Some("a1b2c3d4".to_string()),
            status_message: "Connected".to_string(),
            notice: Some("Couldn't load history".to_string()),
            has_unseen_content: true,
        };
        let text = render_text(&mut title_bar);
        assert!(text.contains("Chatline [online]"));
        assert!(text.contains("with a1b2c3d4"));
        assert!(text.contains("Connected"));
        assert!(text.contains("↓ New"));
        assert!(text.contains("Couldn't load history"));
    }

    #[test]
    fn test_title_bar_minimal() {
        let mut title_bar = TitleBar {
            connection: ConnectionState::Reconnecting,
            active_peer: None,
            status_message: String::new(),
            notice: None,
            has_unseen_content: false,
        };
        let text = render_text(&mut title_bar);
        assert!(text.contains("Chatline [reconnecting]"));
        assert!(!text.contains("|"));
    }
}
