//! The dual-token service: linked access and refresh sessions.
//!
//! A pair is two records in two namespaces of (usually) one store:
//!
//! ```text
//! refresh:<R>  →  { data: {...payload...}, proof: <value> }
//! access:<A>   →  { data: {...payload...}, from: "<R>" }
//! ```
//!
//! `from` is a back-reference, not ownership: the access session doesn't
//! control the refresh session's lifetime, but renewal and value writes
//! follow it to keep both halves in step.
//!
//! # Consistency
//!
//! No operation here is atomic across the two records. The store has no
//! cross-key transactions (it may be a remote cache), so concurrent
//! `set_values` and `renew_pair` calls on one pair can interleave and
//! leave the halves out of sync. Each method documents what is left
//! behind if it fails halfway.

use std::sync::Arc;

use latchkey_codec::{Codec, Payload, Value};
use latchkey_session::{SessionError, SessionManager};
use latchkey_store::Store;
use tokio_util::sync::CancellationToken;

use crate::{ServiceConfig, ServiceError};

const DATA: &str = "data";
const FROM: &str = "from";
const PROOF: &str = "proof";

/// A decoded access record.
struct AccessRecord {
    data: Payload,
    from: String,
}

impl AccessRecord {
    fn parse(mut values: Payload) -> Result<Self, ServiceError> {
        let data = values
            .remove(DATA)
            .and_then(Value::into_map)
            .ok_or_else(|| corrupted("access session has no `data` map"))?;
        let from = match values.remove(FROM) {
            Some(Value::String(from)) => from,
            _ => {
                return Err(corrupted(
                    "access session has no `from` refresh token",
                ));
            }
        };
        Ok(Self { data, from })
    }
}

fn corrupted(reason: &str) -> ServiceError {
    tracing::warn!(reason, "corrupted session record");
    ServiceError::Corrupted(reason.to_string())
}

fn access_values(data: &Payload, from: &str) -> Payload {
    Payload::from([
        (DATA.to_string(), Value::Map(data.clone())),
        (FROM.to_string(), Value::from(from)),
    ])
}

fn refresh_values(data: &Payload, proof: Value) -> Payload {
    Payload::from([
        (DATA.to_string(), Value::Map(data.clone())),
        (PROOF.to_string(), proof),
    ])
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Issues and maintains access/refresh token pairs.
///
/// ## Pair lifecycle
///
/// ```text
/// absent ──init_pair──→ active ──renew_pair──→ active' (old tokens gone)
///                         │  ↑                     │
///                         │  └─request_access──────┤ (new access token,
///                         │                        │  same refresh token)
///                         └──invalidate_pair / expiry──→ absent
/// ```
pub struct Service<S, C> {
    access: SessionManager<S, C>,
    refresh: SessionManager<S, C>,
}

impl<S: Store, C: Codec> Service<S, C> {
    /// Builds both managers over one shared store.
    ///
    /// # Errors
    /// - Any config error from [`SessionManager::new`].
    /// - [`SessionError::InvalidConfig`] if both halves use the same key
    ///   prefix, which would put them in one namespace.
    pub fn new(
        store: Arc<S>,
        codec: C,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError>
    where
        C: Clone,
    {
        let access =
            SessionManager::new(Arc::clone(&store), codec.clone(), config.access)?;
        let refresh = SessionManager::new(store, codec, config.refresh)?;
        Self::from_managers(access, refresh)
    }

    /// Pairs two existing managers. They may use different stores.
    ///
    /// # Errors
    /// [`SessionError::InvalidConfig`] if both share one store under the
    /// same key prefix.
    pub fn from_managers(
        access: SessionManager<S, C>,
        refresh: SessionManager<S, C>,
    ) -> Result<Self, ServiceError> {
        if Arc::ptr_eq(access.store(), refresh.store())
            && access.config().key_prefix == refresh.config().key_prefix
        {
            return Err(SessionError::InvalidConfig(format!(
                "access and refresh sessions share the store and the key prefix {:?}",
                access.config().key_prefix
            ))
            .into());
        }
        Ok(Self { access, refresh })
    }

    /// The manager for short-lived access sessions.
    pub fn access(&self) -> &SessionManager<S, C> {
        &self.access
    }

    /// The manager for long-lived refresh sessions.
    pub fn refresh(&self) -> &SessionManager<S, C> {
        &self.refresh
    }

    async fn access_record(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
    ) -> Result<AccessRecord, ServiceError> {
        let values = self.access.get_values(cancel, access_token).await?;
        AccessRecord::parse(values)
    }

    /// Starts a pair and returns `(access_token, refresh_token)`.
    ///
    /// The refresh record is written first so the access record's `from`
    /// always points at something that already exists.
    ///
    /// If the access write fails, the refresh session is left behind
    /// without an access token; the caller never learns its token, and it
    /// expires on its own.
    pub async fn init_pair(
        &self,
        cancel: &CancellationToken,
        initial: &Payload,
        proof: Value,
    ) -> Result<(String, String), ServiceError> {
        let refresh_token = self
            .refresh
            .init(cancel, &refresh_values(initial, proof))
            .await?;

        let access_token = self
            .access
            .init(cancel, &access_values(initial, &refresh_token))
            .await?;

        tracing::info!("session pair created");
        Ok((access_token, refresh_token))
    }

    /// Ends both halves of a pair. Missing sessions are not an error.
    ///
    /// Both deletions are attempted even if the first fails; the first
    /// error is returned and a second one is logged.
    pub async fn invalidate_pair(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), ServiceError> {
        let refresh_result = self.refresh.invalidate(cancel, refresh_token).await;
        let access_result = self.access.invalidate(cancel, access_token).await;

        match (refresh_result, access_result) {
            (Ok(()), Ok(())) => {
                tracing::info!("session pair invalidated");
                Ok(())
            }
            (Err(first), second) => {
                if let Err(e) = second {
                    tracing::warn!(error = %e, "access invalidation also failed");
                }
                Err(first.into())
            }
            (Ok(()), Err(e)) => Err(e.into()),
        }
    }

    /// Rotates both tokens and returns `(new_access, new_refresh)`.
    ///
    /// The access session must be live, well-formed, and linked to
    /// `refresh_token`. The refresh session is rotated first, then the
    /// access session is replaced by one whose `from` names the new
    /// refresh token. Both old tokens stop working.
    ///
    /// # Errors
    /// - `NotFound` if either session is missing or expired.
    /// - [`ServiceError::Corrupted`] if the access record is malformed.
    /// - [`ServiceError::PairMismatch`] if the tokens aren't a pair.
    ///
    /// If rotating the access half fails after the refresh half has been
    /// rotated, the pair is lost (fail-closed) and the caller has to
    /// authenticate again.
    pub async fn renew_pair(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(String, String), ServiceError> {
        let record = self.access_record(cancel, access_token).await?;
        if record.from != refresh_token {
            return Err(ServiceError::PairMismatch);
        }

        let new_refresh = self.refresh.renew(cancel, refresh_token).await?;

        self.access.invalidate(cancel, access_token).await?;
        let new_access = self
            .access
            .init(cancel, &access_values(&record.data, &new_refresh))
            .await?;

        tracing::info!("session pair renewed");
        Ok((new_access, new_refresh))
    }

    /// Mints a new access token from a refresh token and proof.
    ///
    /// Returns `Ok(None)` if the refresh session is missing or expired, has
    /// no proof, its proof isn't structurally equal to `proof`, or its
    /// `data` isn't a map. On success the new access session links to the
    /// same, unrotated refresh token.
    ///
    /// # Errors
    /// Store and codec failures, including undecodable refresh records.
    pub async fn request_access(
        &self,
        cancel: &CancellationToken,
        refresh_token: &str,
        proof: &Value,
    ) -> Result<Option<String>, ServiceError> {
        let Some(record) = self.refresh.lookup(cancel, refresh_token).await?
        else {
            tracing::debug!("access request rejected: no refresh session");
            return Ok(None);
        };

        if record.values.get(PROOF) != Some(proof) {
            tracing::debug!("access request rejected: proof mismatch");
            return Ok(None);
        }

        let Some(data) = record.values.get(DATA).and_then(Value::as_map)
        else {
            tracing::debug!("access request rejected: refresh data is not a map");
            return Ok(None);
        };

        let access_token = self
            .access
            .init(cancel, &access_values(data, refresh_token))
            .await?;

        tracing::info!("access session issued from refresh session");
        Ok(Some(access_token))
    }

    /// Returns the payload behind an access token.
    ///
    /// # Errors
    /// - `NotFound` if the access session is missing or expired.
    /// - [`ServiceError::Corrupted`] if the record isn't `{data, from}`.
    pub async fn get_values(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
    ) -> Result<Payload, ServiceError> {
        Ok(self.access_record(cancel, access_token).await?.data)
    }

    /// Replaces the payload on both halves of the pair.
    ///
    /// The access session's expiry slides forward as with
    /// [`SessionManager::set_values`]. The refresh session keeps its
    /// proof and its original expiry: payload writes never extend a
    /// refresh session's life.
    ///
    /// # Errors
    /// - `NotFound` if the access session, or the refresh session it
    ///   points at, is missing or expired.
    /// - [`ServiceError::Corrupted`] if either record is malformed.
    ///
    /// If the refresh write fails, the access half already holds the new
    /// payload and the halves differ until the next successful write.
    pub async fn set_values(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        values: &Payload,
    ) -> Result<(), ServiceError> {
        let record = self.access_record(cancel, access_token).await?;

        self.access
            .set_values(cancel, access_token, &access_values(values, &record.from))
            .await?;

        let Some(refresh) = self.refresh.lookup(cancel, &record.from).await?
        else {
            return Err(SessionError::NotFound.into());
        };
        let proof = refresh
            .values
            .get(PROOF)
            .cloned()
            .ok_or_else(|| corrupted("refresh session has no `proof`"))?;

        self.refresh
            .write_record(
                cancel,
                &record.from,
                &refresh_values(values, proof),
                refresh.expiry,
            )
            .await?;

        tracing::debug!("session pair values updated");
        Ok(())
    }
}
