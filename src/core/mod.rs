//! # Core Application Logic
//!
//! This module contains Chatline's business logic.
//! It knows nothing about terminals or sockets.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │    NET     │
//!           │  Adapter   │              │ (ws, http) │
//!           │ (ratatui)  │              │            │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`conversation`]: active peer, live filtering, outbound validation
//! - [`history`]: pagination bookkeeping and the scroll-pause trigger
//! - [`transcript`]: message surface plus scroll anchoring
//! - [`presence`]: the roster
//! - [`config`]: file/env/CLI configuration
//! - [`types`]: shared domain types

pub mod action;
pub mod config;
pub mod conversation;
pub mod history;
pub mod presence;
pub mod state;
pub mod transcript;
pub mod types;
