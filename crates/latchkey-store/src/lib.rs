//! Storage layer for Latchkey.
//!
//! Provides the [`Store`] trait, which abstracts over wherever session
//! bytes live (process memory, a remote cache, a database), and
//! [`MemoryStore`], the in-process reference backend.
//!
//! # Expiry
//!
//! Every entry carries an absolute UTC expiry. Stores enforce it lazily:
//! [`Store::get`] reports an expired entry as absent, but nothing deletes
//! it in the background.
//!
//! # Cancellation
//!
//! Every operation takes a [`CancellationToken`]. Backends that do I/O
//! must abort and return [`StoreError::Cancelled`] once it fires.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use tokio_util::sync::CancellationToken;

use std::future::Future;

use chrono::{DateTime, Utc};

/// One stored value: opaque bytes and the moment they stop being readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub data: Vec<u8>,
    pub expiry: DateTime<Utc>,
}

impl StoredEntry {
    /// Returns `true` once `now` is past the entry's expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry
    }
}

/// A key-value substrate with per-entry expiry.
///
/// # Contract
///
/// - `get` returns `Ok(None)` when the key is absent **or** expired.
///   Callers can't tell the two apart.
/// - `set` unconditionally overwrites whatever the key held.
/// - `delete` is idempotent: deleting an absent key is not an error.
///
/// Keys are plain strings; the store knows nothing about namespaces.
/// Callers that share one store keep apart by prefixing keys.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because one store is shared (behind an `Arc`)
/// by several session managers running on any Tokio worker thread.
pub trait Store: Send + Sync + 'static {
    /// Looks up a live entry.
    fn get(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> impl Future<Output = Result<Option<StoredEntry>, StoreError>> + Send;

    /// Writes `data` under `key`, readable until `expiry`.
    fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        data: Vec<u8>,
        expiry: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes `key` if present.
    fn delete(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
