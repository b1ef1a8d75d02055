//! HTTP access to the Study Buddy backend.
//!
//! Every request carries the stored bearer token when one exists; the
//! token itself lives in durable client storage.

mod client;
mod storage;

pub use client::ApiClient;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
