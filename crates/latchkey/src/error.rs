//! Unified error type for the dual-token service.

use latchkey_session::SessionError;

/// Errors returned by [`Service`](crate::Service).
///
/// Failures from the layers below arrive wrapped in
/// [`ServiceError::Session`]; the `#[from]` attribute lets `?` convert
/// them. The other variants are about the shape of the linked pair.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A session-level error (not found, codec, store, token generation).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The record exists and decodes, but doesn't have the fields its role
    /// requires (`data` and `from` for access, `data` and `proof` for
    /// refresh). Usually a codec or version mismatch. Never coerced.
    #[error("corrupted session data: {0}")]
    Corrupted(String),

    /// The access session does not point back at the refresh token it was
    /// presented with.
    #[error("access session is not linked to the given refresh session")]
    PairMismatch,
}

impl ServiceError {
    /// Returns `true` if the underlying cause is a missing or expired
    /// session.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Session(SessionError::NotFound))
    }
}
