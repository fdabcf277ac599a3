//! Error types for the protocol layer.
//!
//! `ProtocolError` covers turning envelopes into bytes and back. Errors that
//! a caller sees as the outcome of an operation are not protocol errors;
//! they travel inside [`Response::Error`](crate::Response::Error) tagged
//! with an [`ErrorKind`](crate::ErrorKind).

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, or a field
    /// with the wrong data type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
