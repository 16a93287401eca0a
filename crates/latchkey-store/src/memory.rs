//! In-memory [`Store`] backed by a single read-write lock.
//!
//! # Known limitation
//!
//! There is no eviction task. An expired entry stays in the map until it
//! is overwritten or deleted, so a workload that creates sessions and
//! never invalidates them grows without bound. Use a backend with native
//! TTLs (Redis, Memcached) when that matters.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

use crate::{Store, StoreError, StoredEntry};

/// Process-local store for tests, single-node deployments, and examples.
///
/// Reads take the shared lock, writes and deletes take the exclusive one.
/// The lock is the only point where an operation can wait, and that wait
/// is raced against the caller's cancellation token.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries physically held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is held, not even expired entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn read(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RwLockReadGuard<'_, HashMap<String, StoredEntry>>, StoreError>
    {
        // `biased` polls the branches in order, so an already-cancelled
        // token wins even when the lock is free.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            guard = self.entries.read() => Ok(guard),
        }
    }

    async fn write(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredEntry>>, StoreError>
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            guard = self.entries.write() => Ok(guard),
        }
    }
}

impl Store for MemoryStore {
    async fn get(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<Option<StoredEntry>, StoreError> {
        let entries = self.read(cancel).await?;

        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired_at(Utc::now()) {
            tracing::trace!("memory store read skipped an expired entry");
            return Ok(None);
        }
        Ok(Some(entry.clone()))
    }

    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        data: Vec<u8>,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut entries = self.write(cancel).await?;
        entries.insert(key.to_owned(), StoredEntry { data, expiry });
        Ok(())
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<(), StoreError> {
        let mut entries = self.write(cancel).await?;
        entries.remove(key);
        Ok(())
    }
}
