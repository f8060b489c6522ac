//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as parameters:
//! - `TitleBar`: connection state, open conversation, notices
//! - `ChatMessage`: a single message bubble
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: the composer
//! - `RosterPane`: peer list with id-tracked selection
//! - `MessageList`: scrollable transcript with layout caching
//!
//! Components receive external data as "props", not by reaching into `App`.
//! Each file keeps its state types, event types, rendering, event handling
//! and tests together.
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── roster.rs        (Peer list)
//! ├── message.rs       (Single message renderer + height measure)
//! ├── message_list.rs  (Scrollable transcript)
//! └── input_box.rs     (Composer)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub use input_box::{InputBox, InputEvent};
pub mod message;
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod roster;
pub use roster::{RosterEvent, RosterPane, RosterState};
