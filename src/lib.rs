//! Chatline library exports for testing

pub mod core;
pub mod net;
pub mod tui;

#[cfg(test)]
pub mod test_support;
