//! Error types for the codec layer.
//!
//! Each crate in Latchkey defines its own error enum. When you see a
//! `CodecError`, you know the problem is in turning a session record into
//! bytes (or back), not in storage or token handling.

/// Errors that can occur while encoding or decoding a session record.
///
/// The message carries the underlying serializer's description so callers
/// deal with `CodecError` uniformly, regardless of which codec produced it.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The record could not be turned into bytes.
    ///
    /// For [`JsonCodec`](crate::JsonCodec) this includes payloads holding
    /// non-finite floats, which JSON cannot represent.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The bytes are not a record this codec produced.
    ///
    /// Common causes: truncated data, bytes written by a different codec,
    /// or a record written by an incompatible version.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The caller's cancellation token fired before the codec finished.
    #[error("codec operation cancelled")]
    Cancelled,
}
