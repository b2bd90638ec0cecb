/// Errors that can occur in broker client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Frame-level error (stream closed, oversized frame, I/O).
    #[error("frame error: {0}")]
    Frame(#[from] relaymq_frame::FrameError),

    /// Wire codec error while encoding or decoding an entity.
    #[error("wire error: {0}")]
    Wire(#[from] relaymq_wire::WireError),

    /// An I/O error outside the framing layer (connect, shutdown).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbound control frame carried an action type the client does not
    /// handle. The connection is left open; the caller decides whether to
    /// close it.
    #[error("unexpected inbound control action type {0}")]
    Protocol(i32),

    /// The broker reported a fault for a specific queue.
    #[error("{error} (queue: {queue})")]
    Queue { queue: String, error: String },

    /// A subscription handler failed; the triggering message was left
    /// unacknowledged for broker redelivery.
    #[error("handler for `{destination}` failed: {source}")]
    Handler {
        destination: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
