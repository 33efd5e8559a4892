//! # API Layer
//!
//! The endpoint contract of the web front end, as a JSON method
//! dispatcher. Transport (HTTP, CLI, FFI) is left to the caller.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API SURFACE                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  dispatch("encr_api", "{...}")                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiDispatcher ──► dispatch_messages / dispatch_keys ──► PgpService    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok("{...}")  or  Err((code, "{\"error\": kind, ...}"))                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Binary values travel as base64; key ids as 16 hex digits.

mod dispatch_keys;
mod dispatch_messages;
mod dispatcher;

pub use dispatcher::{ApiDispatcher, DResult};
