use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, RosterPane, TitleBar};
use crate::tui::{Focus, TuiState};

/// Width of the peer list column.
const ROSTER_WIDTH: u16 = 28;
/// Composer height: one line of text plus borders.
const INPUT_HEIGHT: u16 = 3;

pub fn draw_ui(frame: &mut Frame, app: &mut App, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let [title_area, body_area, input_area] =
        Layout::vertical([Length(1), Min(0), Length(INPUT_HEIGHT)]).areas(frame.area());
    let [roster_area, main_area] =
        Layout::horizontal([Length(ROSTER_WIDTH), Min(0)]).areas(body_area);

    let active = app.conversation.active_peer().cloned();

    TitleBar {
        connection: app.connection,
        active_peer: active.as_ref().map(|p| p.short().to_string()),
        status_message: app.status_message.clone(),
        notice: app.notice.clone(),
        has_unseen_content: !app.conversation.transcript.is_at_bottom(),
    }
    .render(frame, title_area);

    RosterPane {
        state: &mut tui.roster,
        roster: &app.roster,
        active: active.as_ref(),
        focused: tui.focus == Focus::Roster,
    }
    .render(frame, roster_area);

    if active.is_some() {
        MessageList::new(
            &mut tui.message_list,
            &mut app.conversation.transcript,
            app.roster.self_id(),
        )
        .render(frame, main_area);
    } else {
        draw_empty_view(frame, main_area);
    }

    tui.input_box.recipient = active.as_ref().map(|p| p.short().to_string());
    tui.input_box.focused = tui.focus == Focus::Input;
    tui.input_box.render(frame, input_area);
}

fn draw_empty_view(frame: &mut Frame, area: Rect) {
    let hint = Paragraph::new("No conversation open.\nPick someone from the peer list.")
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().add_modifier(Modifier::DIM)),
        )
        .alignment(Alignment::Center);
    frame.render_widget(hint, area);
}
