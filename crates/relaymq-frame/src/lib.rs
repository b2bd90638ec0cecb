//! Length-prefixed message framing for the relaymq broker protocol.
//!
//! Every frame on the stream is a 4-byte big-endian unsigned payload length
//! followed by exactly that many payload bytes — one encoded wire Message
//! per frame, in both directions. No partial reads, no buffer management in
//! user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
