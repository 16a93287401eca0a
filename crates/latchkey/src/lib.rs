//! # Latchkey
//!
//! Opaque session tokens for server-side authentication middleware.
//!
//! After authenticating a principal, a server calls
//! [`Service::init_pair`] and hands the client two bearer tokens: a
//! short-lived **access** token that unlocks the session payload, and a
//! long-lived **refresh** token that, together with the proof supplied at
//! login, can mint new access tokens or rotate the pair.
//!
//! The pieces underneath are usable on their own:
//!
//! - [`SessionManager`] — one class of expiring sessions over a store
//! - [`Store`] / [`MemoryStore`] — where encoded sessions live
//! - [`Codec`] / [`JsonCodec`] / [`BincodeCodec`] — how sessions are encoded
//!
//! Latchkey never reads headers or cookies; it only deals in token strings
//! the caller passes in.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use latchkey::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ServiceError> {
//! let service = Service::new(
//!     Arc::new(MemoryStore::new()),
//!     JsonCodec,
//!     ServiceConfig::default(),
//! )?;
//! let cancel = CancellationToken::new();
//!
//! let mut user = Payload::new();
//! user.insert("uid".into(), Value::Int(7));
//!
//! let (access, refresh) = service
//!     .init_pair(&cancel, &user, Value::from("device-fingerprint"))
//!     .await?;
//! assert_eq!(service.get_values(&cancel, &access).await?, user);
//!
//! let fresh = service
//!     .request_access(&cancel, &refresh, &Value::from("device-fingerprint"))
//!     .await?;
//! assert!(fresh.is_some());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use service::Service;

pub use latchkey_codec::{
    BincodeCodec, Codec, CodecError, JsonCodec, Payload, Value,
};
pub use latchkey_session::{
    ManagerConfig, SessionError, SessionManager, SessionRecord,
    TOKEN_ALPHABET, generate_token,
};
pub use latchkey_store::{
    CancellationToken, MemoryStore, Store, StoreError, StoredEntry,
};

/// Everything needed to wire up and use a [`Service`].
pub mod prelude {
    pub use crate::{
        CancellationToken, Codec, JsonCodec, ManagerConfig, MemoryStore,
        Payload, Service, ServiceConfig, ServiceError, SessionError,
        SessionManager, Store, Value,
    };
}
