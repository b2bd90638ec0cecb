/// Errors that can occur while encoding or decoding wire entities.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The input ended before a complete field was read.
    #[error("truncated input")]
    Truncated,

    /// A varint ran past the 10-byte maximum.
    #[error("varint overflow (more than 10 bytes)")]
    VarintOverflow,

    /// A known field arrived with the wrong wire type.
    #[error("field {field} has unexpected wire type {wire_type}")]
    UnexpectedWireType { field: u32, wire_type: u8 },

    /// A required field was absent after decoding the whole input.
    #[error("{entity} is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// A string field did not contain valid UTF-8.
    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// An Action carried an operation code this client does not know.
    #[error("unknown action type {0}")]
    UnknownAction(i32),
}

pub type Result<T> = std::result::Result<T, WireError>;
