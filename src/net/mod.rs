//! # Network Layer
//!
//! Everything that talks to the chat server:
//!
//! - [`transport`]: the reconnecting WebSocket for live frames
//! - [`protocol`]: frame classification and the outbound envelope
//! - [`history_client`]: paginated message history over HTTP
//! - [`auth`]: session login/logout

pub mod auth;
pub mod history_client;
pub mod protocol;
pub mod transport;

pub use history_client::{HistoryFetchError, HistorySource, HttpHistoryClient};
pub use protocol::{Frame, FrameParseError};
pub use transport::{ConnectionState, SendOutcome, TransportConfig, TransportEvent, TransportHandle};
