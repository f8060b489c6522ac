//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! ```text
//!  crossterm ──► TuiEvent ──┐
//!                           ├──► update(app, action) ──► Effect ──► transport / history task
//!  std mpsc  ──► Action ────┘
//!     ▲
//!     ├── forwarding task (TransportEvent → protocol::route → Action)
//!     └── history fetch tasks (Action::HistoryLoaded)
//! ```
//!
//! ## Redraw Strategy
//!
//! Draws only when something changed. The poll timeout is short while the
//! scroll debounce is armed (so the pause-at-top fetch fires on time) and
//! long otherwise.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture};
use crossterm::execute;
use tokio::task::{AbortHandle, JoinHandle};

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::history::HistoryRequest;
use crate::core::state::App;
use crate::net::history_client::{HistorySource, HttpHistoryClient};
use crate::net::protocol;
use crate::net::transport::{self, SendOutcome, TransportConfig, TransportEvent, TransportHandle};
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState, RosterEvent, RosterPane, RosterState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Rows moved per arrow key / wheel notch.
const SCROLL_STEP: u32 = 1;
const IDLE_POLL: Duration = Duration::from_millis(250);
const ARMED_POLL: Duration = Duration::from_millis(50);

/// Which pane receives navigation and text keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Roster,
    Input,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub focus: Focus,
    pub roster: RosterState,
    pub message_list: MessageListState,
    pub input_box: InputBox,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            // Nothing to type into until a peer is picked
            focus: Focus::Roster,
            roster: RosterState::new(),
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        info!("Terminal modes enabled (mouse, bracketed paste)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

/// Route transport output into the action channel, in arrival order.
pub async fn forward_transport_events(
    mut events: tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
    tx: mpsc::Sender<Action>,
) {
    while let Some(event) = events.recv().await {
        let action = match event {
            TransportEvent::State(state) => Some(Action::ConnectionChanged(state)),
            TransportEvent::Frame(text) => protocol::route(&text),
        };
        if let Some(action) = action
            && tx.send(action).is_err()
        {
            warn!("Failed to forward transport event: receiver dropped");
            return;
        }
    }
    debug!("Transport event stream ended");
}

fn spawn_transport(config: &ResolvedConfig, tx: mpsc::Sender<Action>) -> (TransportHandle, AbortHandle) {
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let transport_config = TransportConfig {
        url: config.ws_url.clone(),
        session_token: config.session_token.clone(),
        reconnect_delay: config.reconnect_delay,
        connect_timeout: config.connect_timeout,
    };
    let handle = transport::spawn(transport_config, events_tx);
    let forward = tokio::spawn(forward_transport_events(events_rx, tx));
    (handle, forward.abort_handle())
}

/// Fetch one history page in the background and report it as an action.
pub fn spawn_history_fetch(
    source: Arc<dyn HistorySource>,
    request: HistoryRequest,
    tx: mpsc::Sender<Action>,
) -> JoinHandle<()> {
    info!(
        "Fetching history with {} at offset {}",
        request.peer, request.offset
    );
    tokio::spawn(async move {
        let result = source.fetch_page(&request.peer, request.offset).await;
        if let Err(e) = &result {
            warn!("History fetch for {} failed: {}", request.peer, e);
        }
        if tx.send(Action::HistoryLoaded { request, result }).is_err() {
            warn!("Failed to deliver history page: receiver dropped");
        }
    })
}

/// Everything an `Effect` may need to touch.
struct Io {
    transport: TransportHandle,
    history: Arc<dyn HistorySource>,
    tx: mpsc::Sender<Action>,
    /// The fetch for the current conversation, if one is running
    fetch: Option<AbortHandle>,
}

impl Io {
    /// Perform an effect. Returns true when the loop should exit.
    fn execute(&mut self, app: &mut App, effect: Effect) -> bool {
        match effect {
            Effect::None => false,
            Effect::Quit => true,
            Effect::FetchHistory(request) => {
                // A new generation makes the old result stale anyway; stop the work too
                if let Some(previous) = self.fetch.take() {
                    previous.abort();
                }
                let task = spawn_history_fetch(self.history.clone(), request, self.tx.clone());
                self.fetch = Some(task.abort_handle());
                false
            }
            Effect::Send(outbound) => {
                if self.transport.send(&outbound) == SendOutcome::Dropped {
                    app.notice = Some(String::from("Not connected, message not sent"));
                }
                false
            }
        }
    }
}

fn dispatch(app: &mut App, io: &mut Io, action: Action) -> bool {
    let effect = update(app, action);
    io.execute(app, effect)
}

/// Translate a terminal event. Returns true when the loop should exit.
fn handle_event(app: &mut App, tui: &mut TuiState, io: &mut Io, event: TuiEvent) -> bool {
    let now = Instant::now();
    let page = app.conversation.transcript.viewport_height().max(1);
    match event {
        TuiEvent::Quit => return dispatch(app, io, Action::Quit),
        TuiEvent::Resize => {}
        TuiEvent::FocusNext => {
            tui.focus = match tui.focus {
                Focus::Roster => Focus::Input,
                Focus::Input => Focus::Roster,
            };
        }
        // Scrolling goes to the transcript regardless of focus
        TuiEvent::ScrollUp => {
            return dispatch(app, io, Action::ScrollUp { rows: SCROLL_STEP * 3, at: now });
        }
        TuiEvent::ScrollDown => {
            return dispatch(app, io, Action::ScrollDown { rows: SCROLL_STEP * 3, at: now });
        }
        TuiEvent::ScrollPageUp => return dispatch(app, io, Action::ScrollUp { rows: page, at: now }),
        TuiEvent::ScrollPageDown => {
            return dispatch(app, io, Action::ScrollDown { rows: page, at: now });
        }
        TuiEvent::ScrollToBottom => return dispatch(app, io, Action::ScrollToBottom),
        // Clicks only mean something on the peer list, whatever has focus
        TuiEvent::Click { .. } => return roster_event(app, tui, io, &event),
        event => match tui.focus {
            Focus::Roster => return roster_event(app, tui, io, &event),
            Focus::Input => match event {
                // Up/Down have no meaning on a single line; scroll instead
                TuiEvent::CursorUp => {
                    return dispatch(app, io, Action::ScrollUp { rows: SCROLL_STEP, at: now });
                }
                TuiEvent::CursorDown => {
                    return dispatch(app, io, Action::ScrollDown { rows: SCROLL_STEP, at: now });
                }
                event => {
                    if let Some(InputEvent::Submit(text)) = tui.input_box.handle_event(&event) {
                        app.notice = None;
                        return dispatch(app, io, Action::Submit(text));
                    }
                }
            },
        },
    }
    false
}

/// Let the roster pane handle `event`; opening a peer moves focus to the input.
fn roster_event(app: &mut App, tui: &mut TuiState, io: &mut Io, event: &TuiEvent) -> bool {
    let mut pane = RosterPane {
        state: &mut tui.roster,
        roster: &app.roster,
        active: app.conversation.active_peer(),
        focused: tui.focus == Focus::Roster,
    };
    match pane.handle_event(event) {
        Some(RosterEvent::Open(peer)) => {
            tui.focus = Focus::Input;
            tui.message_list = MessageListState::new();
            dispatch(app, io, Action::SelectPeer(peer))
        }
        None => false,
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::from_config(&config);
    let mut tui = TuiState::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    let (transport, forward) = spawn_transport(&config, tx.clone());
    let mut io = Io {
        transport,
        history: Arc::new(
            HttpHistoryClient::new(config.base_url.clone(), config.session_token.clone())
                .with_timeout(config.history_timeout),
        ),
        tx,
        fetch: None,
    };

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut needs_redraw = true;

    'main: loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &mut app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if app.history_trigger.is_armed() {
            ARMED_POLL
        } else {
            IDLE_POLL
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain all pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(&mut app, &mut tui, &mut io, event) {
                break 'main;
            }
        }

        // Background task actions (frames, presence, history pages)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatch(&mut app, &mut io, action) {
                break 'main;
            }
        }

        if app.history_trigger.is_armed() {
            if dispatch(&mut app, &mut io, Action::Tick(Instant::now())) {
                break 'main;
            }
            // Fired: a load just started
            if !app.history_trigger.is_armed() {
                needs_redraw = true;
            }
        }
    }

    info!("Shutting down");
    io.transport.shutdown();
    forward.abort();
    if let Some(fetch) = io.fetch.take() {
        fetch.abort();
    }
    ratatui::restore();
    Ok(())
}
