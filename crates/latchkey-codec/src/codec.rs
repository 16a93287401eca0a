//! Codec trait and implementations for session records.
//!
//! A "codec" (coder/decoder) converts a session record, meaning its
//! [`Payload`] plus the absolute expiry timestamp, to raw bytes and back.
//! The session manager doesn't care HOW records are serialized; it just
//! needs something that implements [`Codec`]. This is the strategy
//! pattern: one interface, swappable implementations.
//!
//! We provide [`JsonCodec`] (human-readable, easy to inspect in a store)
//! and [`BincodeCodec`] (compact binary). Both write the same envelope,
//! `{values, expiry}`, through serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{CodecError, Payload};

/// Converts a session record to bytes and back.
///
/// ## Contract
///
/// - `decode(encode(values, expiry))` returns exactly `(values, expiry)`.
/// - Two records that differ in any value or in their expiry never encode
///   to the same bytes.
/// - Malformed or foreign bytes fail with [`CodecError::Decode`]; decoding
///   never panics and never returns a partially-filled payload.
/// - Every call receives the caller's [`CancellationToken`]. A codec that
///   does I/O (for example one that wraps records with a remote key
///   service) must stop and return [`CodecError::Cancelled`] once it fires.
///   The built-in codecs are pure and only check it before starting.
///
/// ## Trait bounds
///
/// `Send + Sync + 'static` because one codec instance is owned by a
/// session manager that is shared across Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a payload and its expiry into bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::Encode`] if the payload holds something this
    /// format can't represent.
    fn encode(
        &self,
        cancel: &CancellationToken,
        values: &Payload,
        expiry: DateTime<Utc>,
    ) -> Result<Vec<u8>, CodecError>;

    /// Deserializes bytes back into a payload and its expiry.
    ///
    /// # Errors
    /// Returns [`CodecError::Decode`] if the bytes are malformed,
    /// truncated, or were produced by a different format.
    fn decode(
        &self,
        cancel: &CancellationToken,
        data: &[u8],
    ) -> Result<(Payload, DateTime<Utc>), CodecError>;
}

#[cfg(any(feature = "json", feature = "bincode"))]
fn ensure_live(cancel: &CancellationToken) -> Result<(), CodecError> {
    if cancel.is_cancelled() {
        return Err(CodecError::Cancelled);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Borrowed form of the on-disk record, so encoding doesn't clone the
/// payload. Field order must match [`Record`].
#[cfg(any(feature = "json", feature = "bincode"))]
#[derive(Serialize)]
struct RecordRef<'a> {
    values: &'a Payload,
    expiry: DateTime<Utc>,
}

#[cfg(any(feature = "json", feature = "bincode"))]
#[derive(Deserialize)]
struct Record {
    values: Payload,
    expiry: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is self-describing and readable, which makes records easy to
/// inspect in a key-value store. The cost is size, and one limitation:
/// JSON has no encoding for NaN or infinity, so payloads holding
/// non-finite floats are rejected with [`CodecError::Encode`] instead of
/// being silently written as `null`. Finite floats are written with
/// their shortest exact representation and parsed back bit for bit
/// (`serde_json`'s `float_roundtrip` feature).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use chrono::Utc;
/// use latchkey_codec::{Codec, JsonCodec, Payload, Value};
/// use tokio_util::sync::CancellationToken;
///
/// let codec = JsonCodec;
/// let cancel = CancellationToken::new();
/// let mut values = Payload::new();
/// values.insert("uid".into(), Value::Int(7));
/// let expiry = Utc::now();
///
/// let bytes = codec.encode(&cancel, &values, expiry).unwrap();
/// let (decoded, decoded_expiry) = codec.decode(&cancel, &bytes).unwrap();
/// assert_eq!(decoded, values);
/// assert_eq!(decoded_expiry, expiry);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(
        &self,
        cancel: &CancellationToken,
        values: &Payload,
        expiry: DateTime<Utc>,
    ) -> Result<Vec<u8>, CodecError> {
        ensure_live(cancel)?;
        if let Some((key, _)) =
            values.iter().find(|(_, v)| v.has_non_finite())
        {
            return Err(CodecError::Encode(format!(
                "key {key:?} holds a non-finite float"
            )));
        }

        serde_json::to_vec(&RecordRef { values, expiry })
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(
        &self,
        cancel: &CancellationToken,
        data: &[u8],
    ) -> Result<(Payload, DateTime<Utc>), CodecError> {
        ensure_live(cancel)?;
        let record: Record = serde_json::from_slice(data)
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok((record.values, record.expiry))
    }
}

// ---------------------------------------------------------------------------
// BincodeCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses `bincode`'s compact binary format.
///
/// Smaller and faster than JSON, and it round-trips every [`Value`]
/// including NaN and infinite floats. The variant tags of [`Value`] keep
/// the record self-describing enough to preserve each value's kind.
///
/// This is behind the `bincode` feature flag (enabled by default).
///
/// [`Value`]: crate::Value
#[cfg(feature = "bincode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl Codec for BincodeCodec {
    fn encode(
        &self,
        cancel: &CancellationToken,
        values: &Payload,
        expiry: DateTime<Utc>,
    ) -> Result<Vec<u8>, CodecError> {
        ensure_live(cancel)?;
        bincode::serialize(&RecordRef { values, expiry })
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(
        &self,
        cancel: &CancellationToken,
        data: &[u8],
    ) -> Result<(Payload, DateTime<Utc>), CodecError> {
        ensure_live(cancel)?;
        let record: Record = bincode::deserialize(data)
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok((record.values, record.expiry))
    }
}
