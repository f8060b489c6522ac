//! # Real-time Transport
//!
//! Owns the one WebSocket connection of the session and keeps it alive.
//!
//! ```text
//!            Opened                 Closed
//! Connecting ──────► Open ────────────────────► Reconnecting
//!     ▲  │                                          │
//!     │  └──────────── Failed ─────────────────────►│
//!     └──────────────── BackoffElapsed ─────────────┘
//! ```
//!
//! There is no terminal state. Every closure, whatever the cause, is followed
//! by a fixed delay and a fresh attempt, forever. The loop runs on its own
//! tokio task and is torn down by aborting that task.
//!
//! Sends are only accepted while `Open`. Anything still queued from an old
//! connection is thrown away when the next one opens; nothing is replayed.

use std::fmt;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::core::types::OutboundMessage;
use crate::net::history_client::session_cookie;
use crate::net::protocol::encode_outbound;

/// Flat delay between a closure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);
/// Upper bound on the WebSocket handshake. A server that accepts the TCP
/// connection and then goes quiet counts as a failed attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Failed,
    Closed,
    BackoffElapsed,
}

impl ConnectionState {
    /// Next state for `event`. Events that make no sense in the current
    /// state leave it unchanged.
    pub fn on(self, event: ConnectionEvent) -> Self {
        use ConnectionEvent::*;
        use ConnectionState::*;
        match (self, event) {
            (Connecting, Opened) => Open,
            (Connecting, Failed) => Reconnecting,
            (Open, Closed) => Reconnecting,
            (Reconnecting, BackoffElapsed) => Connecting,
            (state, _) => state,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "online",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

/// What the transport reports to the rest of the client.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    State(ConnectionState),
    Frame(String),
}

#[derive(Debug)]
pub enum TransportError {
    /// URL or header could not be turned into a handshake request.
    Request(String),
    /// Handshake or socket failure.
    Connect(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(msg) => write!(f, "bad websocket request: {msg}"),
            TransportError::Connect(msg) => write!(f, "websocket error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::Connect(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub session_token: Option<String>,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_token: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// Not connected; the frame was discarded.
    Dropped,
}

/// Client-side handle to the transport task. Dropping it stops the task.
pub struct TransportHandle {
    outbound: mpsc::UnboundedSender<String>,
    state: watch::Receiver<ConnectionState>,
    task: AbortHandle,
}

impl TransportHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn send(&self, message: &OutboundMessage) -> SendOutcome {
        let state = self.state();
        if state != ConnectionState::Open {
            debug!("Dropping outbound message to {}: {}", message.to, state.label());
            return SendOutcome::Dropped;
        }
        match self.outbound.send(encode_outbound(message)) {
            Ok(()) => SendOutcome::Queued,
            Err(_) => {
                warn!("Transport task is gone, dropping outbound message");
                SendOutcome::Dropped
            }
        }
    }

    /// Stop reconnecting and close the connection.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the connection loop on the current tokio runtime.
pub fn spawn(
    config: TransportConfig,
    events: mpsc::UnboundedSender<TransportEvent>,
) -> TransportHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
    let task = tokio::spawn(run(config, events, state_tx, outbound_rx));
    TransportHandle {
        outbound: outbound_tx,
        state: state_rx,
        task: task.abort_handle(),
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// Peer closed or the socket failed; reconnect.
    Closed,
    /// Nobody is listening any more; stop for good.
    Shutdown,
}

struct StateCell {
    current: ConnectionState,
    tx: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl StateCell {
    /// Apply a transition and publish it. Returns false once the event
    /// receiver is gone.
    fn apply(&mut self, event: ConnectionEvent) -> bool {
        let next = self.current.on(event);
        if next == self.current {
            return true;
        }
        debug!("Connection {:?} --{:?}--> {:?}", self.current, event, next);
        self.current = next;
        self.tx.send_replace(next);
        self.events.send(TransportEvent::State(next)).is_ok()
    }
}

async fn run(
    config: TransportConfig,
    events: mpsc::UnboundedSender<TransportEvent>,
    state_tx: watch::Sender<ConnectionState>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    let mut state = StateCell {
        current: ConnectionState::Connecting,
        tx: state_tx,
        events: events.clone(),
    };
    if state
        .events
        .send(TransportEvent::State(ConnectionState::Connecting))
        .is_err()
    {
        return;
    }

    loop {
        match connect(&config).await {
            Ok(ws) => {
                let stale = drain(&mut outbound_rx);
                if stale > 0 {
                    debug!("Discarded {} frames queued before this connection", stale);
                }
                info!("Connected to {}", config.url);
                if !state.apply(ConnectionEvent::Opened) {
                    return;
                }
                match session(ws, &events, &mut outbound_rx).await {
                    Ok(SessionEnd::Shutdown) => {
                        info!("Transport shutting down");
                        return;
                    }
                    Ok(SessionEnd::Closed) => info!("Connection to {} closed", config.url),
                    Err(e) => warn!("Connection to {} lost: {}", config.url, e),
                }
                if !state.apply(ConnectionEvent::Closed) {
                    return;
                }
            }
            Err(e) => {
                warn!("Connecting to {} failed: {}", config.url, e);
                if !state.apply(ConnectionEvent::Failed) {
                    return;
                }
            }
        }

        debug!("Reconnecting in {:?}", config.reconnect_delay);
        tokio::time::sleep(config.reconnect_delay).await;
        if !state.apply(ConnectionEvent::BackoffElapsed) {
            return;
        }
    }
}

fn drain(outbound_rx: &mut mpsc::UnboundedReceiver<String>) -> usize {
    let mut count = 0;
    while outbound_rx.try_recv().is_ok() {
        count += 1;
    }
    count
}

async fn connect(config: &TransportConfig) -> Result<Ws, TransportError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::Request(e.to_string()))?;
    if let Some(token) = &config.session_token {
        let cookie = HeaderValue::from_str(&session_cookie(token))
            .map_err(|e| TransportError::Request(e.to_string()))?;
        request.headers_mut().insert(COOKIE, cookie);
    }
    let handshake = tokio::time::timeout(config.connect_timeout, connect_async(request)).await;
    let (ws, _response) = match handshake {
        Ok(result) => result?,
        Err(_) => {
            return Err(TransportError::Connect(format!(
                "handshake timed out after {:?}",
                config.connect_timeout
            )));
        }
    };
    Ok(ws)
}

async fn session(
    ws: Ws,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, TransportError> {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    if events.send(TransportEvent::Frame(text.as_str().to_string())).is_err() {
                        return Ok(SessionEnd::Shutdown);
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!("Server closed the connection: {:?}", frame);
                    return Ok(SessionEnd::Closed);
                }
                // Pings are answered by tungstenite; binary frames are not part of the protocol
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(SessionEnd::Closed),
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(frame) => sink.send(WsMessage::Text(frame.into())).await?,
                None => return Ok(SessionEnd::Shutdown),
            },
        }
    }
}
