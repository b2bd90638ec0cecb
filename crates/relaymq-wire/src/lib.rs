//! Binary wire codec for the relaymq broker protocol.
//!
//! The broker speaks protocol-buffers wire format. Field numbers and wire
//! types are part of the interop contract with the broker and must not be
//! renumbered. Unknown field numbers are skipped on decode so newer brokers
//! can add fields without breaking older clients.

pub mod action;
pub mod error;
pub mod message;
pub mod stat;

mod varint;

pub use action::{Action, BondRequest, ConnectionConfigure, QueueError};
pub use error::{Result, WireError};
pub use message::{Message, STAT_KIND};
pub use stat::Stat;
