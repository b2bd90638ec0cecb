//! Client for the relaymq message-broker wire protocol.
//!
//! relaymq frames and serializes structured messages over a persistent
//! stream connection, multiplexes a control channel onto the same stream
//! as data traffic, and dispatches deliveries to per-destination handlers
//! with ack-on-success semantics.
//!
//! # Crate Structure
//!
//! - [`wire`] — Binary wire codec for messages, actions, and stats
//! - [`frame`] — Length-prefixed framing over a byte stream
//! - [`client`] — Broker session and the safe-queue dispatcher

/// Re-export wire codec types.
pub mod wire {
    pub use relaymq_wire::*;
}

/// Re-export frame types.
pub mod frame {
    pub use relaymq_frame::*;
}

/// Re-export session and dispatcher types.
pub mod client {
    pub use relaymq_client::*;
}
