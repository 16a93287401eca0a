//! Error types for the session layer.

use latchkey_codec::CodecError;
use latchkey_store::StoreError;

/// Errors that can occur during session management.
///
/// These cover the full lifecycle of a session: token generation,
/// encoding, storage, lookup, and rotation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A token length below 1 was requested.
    #[error("token length must be at least 1, got {0}")]
    InvalidLength(usize),

    /// The manager configuration can't be used (zero lifetime, lifetime
    /// too large for a timestamp, clashing key prefixes).
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// The operating system's random source failed. Never retried.
    #[error("token generation failed: {0}")]
    TokenGen(String),

    /// No live session exists for the token.
    ///
    /// Returned alike for tokens that never existed and for tokens whose
    /// session expired, so callers learn nothing about which it was.
    #[error("session not found")]
    NotFound,

    /// The record couldn't be encoded, or stored bytes couldn't be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The store backend failed or the operation was cancelled.
    #[error(transparent)]
    Store(#[from] StoreError),
}
