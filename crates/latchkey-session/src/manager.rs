//! The session manager: maps random tokens to expiring payloads.
//!
//! One manager handles one class of session. It is responsible for:
//! - Generating a token for every new session
//! - Computing expiry from its configured lifetime
//! - Encoding records through a [`Codec`] and persisting them in a [`Store`]
//! - Namespacing store keys with its prefix
//! - Rotating tokens
//!
//! # Concurrency note
//!
//! The manager itself holds no lock. Every method is a short sequence of
//! store calls and the store serializes each call on its own. Sequences
//! such as [`renew`](SessionManager::renew) are therefore NOT atomic: another task can
//! observe (or change) the session between the steps.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use latchkey_codec::{Codec, Payload};
use latchkey_store::Store;
use tokio_util::sync::CancellationToken;

use crate::{ManagerConfig, SessionError, generate_token};

/// A decoded session: what one token currently maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub values: Payload,
    pub expiry: DateTime<Utc>,
}

/// Issues, reads, rewrites, rotates, and invalidates sessions of one class.
///
/// ## Lifecycle
///
/// ```text
/// init() ──→ [live] ──(set_values: expiry slides forward)──→ [live]
///               │                                              │
///               ├──(renew)──→ old token gone, new token [live] │
///               │                                              │
///               └──(invalidate, or now > expiry)──→ [gone] ←───┘
/// ```
///
/// The store is held behind an `Arc` so several managers (for example the
/// access and refresh halves of a `latchkey::Service`) can share one
/// backend. Their key prefixes keep them apart.
pub struct SessionManager<S, C> {
    store: Arc<S>,
    codec: C,
    config: ManagerConfig,

    /// `config.lifetime`, converted once at construction.
    lifetime: TimeDelta,
}

impl<S: Store, C: Codec> SessionManager<S, C> {
    /// Creates a manager over `store` using `codec`.
    ///
    /// # Errors
    /// Returns the error from [`ManagerConfig::validate`] if the config
    /// can't be used.
    pub fn new(
        store: Arc<S>,
        codec: C,
        config: ManagerConfig,
    ) -> Result<Self, SessionError> {
        let lifetime = config.validate()?;
        Ok(Self {
            store,
            codec,
            config,
            lifetime,
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The configured lifetime as the `chrono` delta added to `Utc::now()`
    /// for every new expiry.
    pub fn lifetime_delta(&self) -> TimeDelta {
        self.lifetime
    }

    /// The shared store this manager writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn storage_key(&self, token: &str) -> String {
        format!("{}{}", self.config.key_prefix, token)
    }

    fn next_expiry(&self) -> Result<DateTime<Utc>, SessionError> {
        Utc::now().checked_add_signed(self.lifetime).ok_or_else(|| {
            SessionError::InvalidConfig(
                "session expiry overflows the timestamp range".into(),
            )
        })
    }

    // -- Record-level access ----------------------------------------------

    /// Encodes `values` and stores them under `token` with an explicit
    /// expiry, overwriting whatever was there.
    ///
    /// Unlike [`set_values`](Self::set_values) this neither requires the
    /// session to exist nor recomputes the expiry. It is the building
    /// block for callers that must keep a record's original lifetime.
    pub async fn write_record(
        &self,
        cancel: &CancellationToken,
        token: &str,
        values: &Payload,
        expiry: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let data = self.codec.encode(cancel, values, expiry)?;
        self.store
            .set(cancel, &self.storage_key(token), data, expiry)
            .await?;
        tracing::debug!(prefix = %self.config.key_prefix, %expiry, "session record written");
        Ok(())
    }

    /// Reads and decodes the record for `token`.
    ///
    /// Returns `Ok(None)` if there is no live session.
    pub async fn lookup(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> Result<Option<SessionRecord>, SessionError> {
        let Some(entry) =
            self.store.get(cancel, &self.storage_key(token)).await?
        else {
            return Ok(None);
        };

        let (values, expiry) = self.codec.decode(cancel, &entry.data)?;
        Ok(Some(SessionRecord { values, expiry }))
    }

    // -- Session operations -----------------------------------------------

    /// Starts a new session holding `values` and returns its token.
    ///
    /// The session expires `lifetime` from now. An empty payload is fine.
    pub async fn init(
        &self,
        cancel: &CancellationToken,
        values: &Payload,
    ) -> Result<String, SessionError> {
        let token = generate_token(self.config.token_length)?;
        let expiry = self.next_expiry()?;

        self.write_record(cancel, &token, values, expiry).await?;

        tracing::info!(
            prefix = %self.config.key_prefix,
            lifetime_secs = self.config.lifetime.as_secs(),
            "session created"
        );
        Ok(token)
    }

    /// Returns the payload of a live session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the token is unknown or expired; the
    /// two cases are deliberately indistinguishable.
    pub async fn get_values(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> Result<Payload, SessionError> {
        self.lookup(cancel, token)
            .await?
            .map(|record| record.values)
            .ok_or(SessionError::NotFound)
    }

    /// Replaces the payload of a live session.
    ///
    /// The expiry is recomputed as `now + lifetime`, so every write slides
    /// the session's lifetime forward.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if there is no live session. Writing to
    /// a missing session never creates one.
    pub async fn set_values(
        &self,
        cancel: &CancellationToken,
        token: &str,
        values: &Payload,
    ) -> Result<(), SessionError> {
        if self.lookup(cancel, token).await?.is_none() {
            return Err(SessionError::NotFound);
        }

        let expiry = self.next_expiry()?;
        self.write_record(cancel, token, values, expiry).await
    }

    /// Deletes the session. Deleting a missing session is not an error.
    pub async fn invalidate(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> Result<(), SessionError> {
        self.store.delete(cancel, &self.storage_key(token)).await?;
        tracing::info!(prefix = %self.config.key_prefix, "session invalidated");
        Ok(())
    }

    /// Moves the session's payload to a freshly generated token and
    /// returns it. The old token stops working.
    ///
    /// The new session gets a full lifetime from now.
    ///
    /// # Partial failure
    ///
    /// The old record is deleted before the new one is written. If that
    /// second write fails the caller gets its error and is left with no
    /// session at all; a rotation never leaves the old token usable.
    pub async fn renew(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> Result<String, SessionError> {
        let values = self.get_values(cancel, token).await?;

        self.invalidate(cancel, token).await?;

        let new_token = self.init(cancel, &values).await.inspect_err(|e| {
            tracing::warn!(
                prefix = %self.config.key_prefix,
                error = %e,
                "session renewal lost the session after deleting the old token"
            );
        })?;

        tracing::info!(prefix = %self.config.key_prefix, "session token renewed");
        Ok(new_token)
    }
}

// =========================================================================
// Tests
// =========================================================================
