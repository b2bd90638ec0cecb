//! Broker session and safe-queue dispatcher for the relaymq protocol.
//!
//! This is the "just works" layer. Connect to a broker, publish to
//! destinations, subscribe handlers, and let the broker redeliver anything
//! a handler fails on.

pub mod client;
pub mod error;
pub mod safe_queue;

pub use client::{Client, CONTROL_DESTINATION, DEFAULT_PORT};
pub use error::{ClientError, Result};
pub use safe_queue::SafeQueue;
