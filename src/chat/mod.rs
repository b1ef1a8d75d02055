//! Session chat.
//!
//! Only one chat subscription is live at a time. New messages are pulled
//! with a `since` cursor on a backoff-aware poller.

pub mod format;
mod panel;
mod poller;

pub use panel::{ChatPanel, ChatPhase, MessageBuffer, SendOutcome, CONNECTED, CONNECTION_ERROR};
pub use poller::Backoff;
