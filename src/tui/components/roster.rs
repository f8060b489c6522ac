//! # Roster Component
//!
//! Left-hand pane listing peers from the latest presence snapshot.
//!
//! Selection is tracked by peer id rather than index, so it stays on the
//! same person when a new snapshot reorders the list. Rows can be opened
//! with Enter or a left click; the last rendered area maps clicks to rows.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState};
use unicode_width::UnicodeWidthChar;

use crate::core::presence::Roster;
use crate::core::types::{Peer, PeerId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum RosterEvent {
    /// Open the conversation with this peer.
    Open(PeerId),
}

#[derive(Default)]
pub struct RosterState {
    pub selected: Option<PeerId>,
    list_state: ListState,
    /// Rows area (inside the border) from the last render.
    rows_area: Rect,
}

impl RosterState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct RosterPane<'a> {
    pub state: &'a mut RosterState,
    pub roster: &'a Roster,
    pub active: Option<&'a PeerId>,
    pub focused: bool,
}

/// Cut `text` to at most `max` display columns.
fn truncate(text: &str, max: usize) -> String {
    let mut width = 0;
    text.chars()
        .take_while(|c| {
            width += c.width().unwrap_or(0);
            width <= max
        })
        .collect()
}

impl<'a> RosterPane<'a> {
    fn selected_index(&self) -> Option<usize> {
        self.state
            .selected
            .as_ref()
            .and_then(|id| self.roster.position(id))
    }

    /// Roster index under a screen cell, if any.
    fn index_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.state.rows_area;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let index = self.state.list_state.offset() + (row - area.y) as usize;
        (index < self.roster.len()).then_some(index)
    }

    fn select(&mut self, index: usize) {
        self.state.selected = self.roster.get(index).map(|p| p.id.clone());
    }

    fn row(&self, peer: &Peer, width: usize) -> ListItem<'static> {
        let (dot, dot_style) = if peer.is_online {
            ("● ", Style::default().fg(Color::Green))
        } else {
            ("○ ", Style::default().fg(Color::DarkGray))
        };
        let unread = self.roster.is_unread(&peer.id);
        let badge = if unread { " *" } else { "" };

        let mut name_style = Style::default();
        if self.active == Some(&peer.id) {
            name_style = name_style.fg(Color::Cyan);
        }
        if unread {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }

        let name = truncate(peer.id.as_str(), width.saturating_sub(2 + badge.len()));
        ListItem::new(Line::from(vec![
            Span::styled(dot, dot_style),
            Span::styled(name, name_style),
            Span::styled(badge, Style::default().fg(Color::Yellow)),
        ]))
    }
}

impl<'a> Component for RosterPane<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = self
            .roster
            .peers()
            .iter()
            .map(|peer| self.row(peer, inner_width))
            .collect();

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let list = List::new(items)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(border_style)
                    .title(format!("Peers ({})", self.roster.len())),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        self.state.rows_area = Rect::new(
            area.x.saturating_add(1),
            area.y.saturating_add(1),
            area.width.saturating_sub(2),
            area.height.saturating_sub(2),
        );
        let index = self.selected_index();
        self.state.list_state.select(index);
        frame.render_stateful_widget(list, area, &mut self.state.list_state);
    }
}

impl<'a> EventHandler for RosterPane<'a> {
    type Event = RosterEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.roster.is_empty() {
            return None;
        }
        let last = self.roster.len() - 1;
        match event {
            TuiEvent::CursorUp => {
                let index = self.selected_index().map_or(0, |i| i.saturating_sub(1));
                self.select(index);
                None
            }
            TuiEvent::CursorDown => {
                let index = self.selected_index().map_or(0, |i| (i + 1).min(last));
                self.select(index);
                None
            }
            TuiEvent::CursorHome => {
                self.select(0);
                None
            }
            TuiEvent::CursorEnd => {
                self.select(last);
                None
            }
            TuiEvent::Submit => {
                if self.selected_index().is_none() {
                    self.select(0);
                }
                self.state.selected.clone().map(RosterEvent::Open)
            }
            TuiEvent::Click { column, row } => {
                let index = self.index_at(*column, *row)?;
                self.select(index);
                self.state.selected.clone().map(RosterEvent::Open)
            }
            _ => None,
        }
    }
}
