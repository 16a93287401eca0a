//! Session payload model and codecs for Latchkey.
//!
//! This crate defines what a session "holds" and how that is turned into
//! bytes for a store:
//!
//! - **Values** ([`Value`], [`Payload`]) — the generic, dynamically-typed
//!   key-value data attached to a session.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`BincodeCodec`]) — how a
//!   payload plus its expiry timestamp become bytes and back.
//! - **Errors** ([`CodecError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The codec layer sits below the session manager. It knows nothing about
//! tokens, stores, or lifetimes — it only converts records.
//!
//! ```text
//! Session manager (tokens) → Codec (Payload + expiry ↔ bytes) → Store (bytes)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod value;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

#[cfg(feature = "bincode")]
pub use codec::BincodeCodec;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::CodecError;
pub use value::{Payload, Value};
