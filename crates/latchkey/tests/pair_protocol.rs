//! Integration tests for the access/refresh pair protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use latchkey::prelude::*;
use latchkey::{BincodeCodec, StoreError, StoredEntry};

// =========================================================================
// Helpers
// =========================================================================

fn service() -> Service<MemoryStore, JsonCodec> {
    Service::new(
        Arc::new(MemoryStore::new()),
        JsonCodec,
        ServiceConfig::default(),
    )
    .unwrap()
}

fn uid(n: i64) -> Payload {
    Payload::from([("uid".to_string(), Value::Int(n))])
}

/// A store whose deletes fail for keys under one prefix.
#[derive(Default)]
struct StubbornStore {
    inner: MemoryStore,
    refuse_deletes_under: Option<&'static str>,
    deletes_seen: AtomicBool,
}

impl Store for StubbornStore {
    async fn get(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<Option<StoredEntry>, StoreError> {
        self.inner.get(cancel, key).await
    }

    async fn set(
        &self,
        cancel: &CancellationToken,
        key: &str,
        data: Vec<u8>,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.set(cancel, key, data, expiry).await
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<(), StoreError> {
        self.deletes_seen.store(true, Ordering::SeqCst);
        if let Some(prefix) = self.refuse_deletes_under {
            if key.starts_with(prefix) {
                return Err(StoreError::Io("replica unreachable".into()));
            }
        }
        self.inner.delete(cancel, key).await
    }
}

// =========================================================================
// End-to-end scenario
// =========================================================================

#[tokio::test]
async fn test_pair_end_to_end_scenario() {
    let svc = service();
    let cancel = CancellationToken::new();

    // 1. Login: a pair is issued.
    let (a1, r1) = svc
        .init_pair(&cancel, &uid(7), Value::from("p1"))
        .await
        .unwrap();

    // 2. The right proof mints a second access token.
    let a2 = svc
        .request_access(&cancel, &r1, &Value::from("p1"))
        .await
        .unwrap()
        .expect("correct proof should be accepted");
    assert_ne!(a2, a1);

    // 3. A wrong proof is refused without an error.
    let refused = svc
        .request_access(&cancel, &r1, &Value::from("wrong"))
        .await
        .unwrap();
    assert!(refused.is_none());

    // 4. The original access token still reads the payload.
    assert_eq!(svc.get_values(&cancel, &a1).await.unwrap(), uid(7));

    // 5. Logout.
    svc.invalidate_pair(&cancel, &a1, &r1).await.unwrap();

    let err = svc.get_values(&cancel, &a1).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_request_access_links_new_token_to_same_refresh() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (_a1, r1) = svc
        .init_pair(&cancel, &uid(7), Value::from("p1"))
        .await
        .unwrap();

    let a2 = svc
        .request_access(&cancel, &r1, &Value::from("p1"))
        .await
        .unwrap()
        .unwrap();

    let raw = svc.access().get_values(&cancel, &a2).await.unwrap();
    assert_eq!(raw["from"], Value::from(r1.as_str()));
    assert_eq!(raw["data"], Value::Map(uid(7)));
    // The refresh token was not rotated.
    assert!(svc.refresh().get_values(&cancel, &r1).await.is_ok());
}

#[tokio::test]
async fn test_request_access_unknown_refresh_returns_none() {
    let svc = service();
    let cancel = CancellationToken::new();

    let result = svc
        .request_access(&cancel, "missing", &Value::from("p1"))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_request_access_compares_proof_structurally() {
    let svc = service();
    let cancel = CancellationToken::new();
    let proof = Value::Map(Payload::from([
        ("device".to_string(), Value::from("laptop")),
        ("ver".to_string(), Value::Int(2)),
    ]));
    let (_a, r) = svc
        .init_pair(&cancel, &uid(1), proof.clone())
        .await
        .unwrap();

    // A separately built but equal map is accepted...
    let same = Value::Map(Payload::from([
        ("ver".to_string(), Value::Int(2)),
        ("device".to_string(), Value::from("laptop")),
    ]));
    assert!(svc.request_access(&cancel, &r, &same).await.unwrap().is_some());

    // ...while a change of kind is not.
    let float_ver = Value::Map(Payload::from([
        ("device".to_string(), Value::from("laptop")),
        ("ver".to_string(), Value::Float(2.0)),
    ]));
    assert!(
        svc.request_access(&cancel, &r, &float_ver)
            .await
            .unwrap()
            .is_none()
    );
}

// =========================================================================
// Value propagation
// =========================================================================

#[tokio::test]
async fn test_set_values_updates_both_halves_and_keeps_refresh_expiry() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(7), Value::from("p1"))
        .await
        .unwrap();
    let before = svc.refresh().lookup(&cancel, &r).await.unwrap().unwrap();

    svc.set_values(&cancel, &a, &uid(8)).await.unwrap();

    assert_eq!(svc.get_values(&cancel, &a).await.unwrap(), uid(8));
    let after = svc.refresh().lookup(&cancel, &r).await.unwrap().unwrap();
    assert_eq!(after.values["data"], Value::Map(uid(8)));
    assert_eq!(after.values["proof"], Value::from("p1"));
    assert_eq!(after.expiry, before.expiry);
}

#[tokio::test]
async fn test_set_values_then_request_access_sees_new_payload() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(7), Value::from("p1"))
        .await
        .unwrap();

    svc.set_values(&cancel, &a, &uid(9)).await.unwrap();
    let a2 = svc
        .request_access(&cancel, &r, &Value::from("p1"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(svc.get_values(&cancel, &a2).await.unwrap(), uid(9));
}

#[tokio::test]
async fn test_set_values_missing_refresh_returns_not_found() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(7), Value::from("p1"))
        .await
        .unwrap();
    svc.refresh().invalidate(&cancel, &r).await.unwrap();

    let err = svc.set_values(&cancel, &a, &uid(8)).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_set_values_unknown_access_returns_not_found() {
    let svc = service();
    let cancel = CancellationToken::new();

    let err = svc.set_values(&cancel, "nope", &uid(1)).await.unwrap_err();

    assert!(err.is_not_found());
}

// =========================================================================
// Renewal
// =========================================================================

#[tokio::test]
async fn test_renew_pair_rotates_both_and_relinks_access() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a1, r1) = svc
        .init_pair(&cancel, &uid(7), Value::from("p1"))
        .await
        .unwrap();

    let (a2, r2) = svc.renew_pair(&cancel, &a1, &r1).await.unwrap();

    assert_ne!(a1, a2);
    assert_ne!(r1, r2);
    assert!(svc.get_values(&cancel, &a1).await.unwrap_err().is_not_found());
    assert!(
        svc.request_access(&cancel, &r1, &Value::from("p1"))
            .await
            .unwrap()
            .is_none()
    );

    assert_eq!(svc.get_values(&cancel, &a2).await.unwrap(), uid(7));
    let raw = svc.access().get_values(&cancel, &a2).await.unwrap();
    assert_eq!(raw["from"], Value::from(r2.as_str()));

    // The rotated refresh token still carries the proof, and writes
    // through the new access token reach it.
    svc.set_values(&cancel, &a2, &uid(8)).await.unwrap();
    let a3 = svc
        .request_access(&cancel, &r2, &Value::from("p1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(svc.get_values(&cancel, &a3).await.unwrap(), uid(8));
}

#[tokio::test]
async fn test_renew_pair_unlinked_tokens_returns_pair_mismatch() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a1, r1) = svc
        .init_pair(&cancel, &uid(1), Value::from("p1"))
        .await
        .unwrap();
    let (_a2, r2) = svc
        .init_pair(&cancel, &uid(2), Value::from("p2"))
        .await
        .unwrap();

    let result = svc.renew_pair(&cancel, &a1, &r2).await;

    assert!(matches!(result, Err(ServiceError::PairMismatch)));
    // Nothing was rotated.
    assert_eq!(svc.get_values(&cancel, &a1).await.unwrap(), uid(1));
    assert!(svc.refresh().get_values(&cancel, &r1).await.is_ok());
    assert!(svc.refresh().get_values(&cancel, &r2).await.is_ok());
}

#[tokio::test]
async fn test_renew_pair_after_invalidate_returns_not_found() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(1), Value::from("p1"))
        .await
        .unwrap();
    svc.invalidate_pair(&cancel, &a, &r).await.unwrap();

    let err = svc.renew_pair(&cancel, &a, &r).await.unwrap_err();

    assert!(err.is_not_found());
}

// =========================================================================
// Invalidation
// =========================================================================

#[tokio::test]
async fn test_invalidate_pair_twice_is_ok() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(1), Value::from("p1"))
        .await
        .unwrap();

    svc.invalidate_pair(&cancel, &a, &r).await.unwrap();
    svc.invalidate_pair(&cancel, &a, &r).await.unwrap();
}

#[tokio::test]
async fn test_invalidate_pair_refresh_failure_still_removes_access() {
    let store = Arc::new(StubbornStore {
        refuse_deletes_under: Some("refresh:"),
        ..StubbornStore::default()
    });
    let svc =
        Service::new(Arc::clone(&store), JsonCodec, ServiceConfig::default())
            .unwrap();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(1), Value::from("p1"))
        .await
        .unwrap();

    let result = svc.invalidate_pair(&cancel, &a, &r).await;

    assert!(matches!(
        result,
        Err(ServiceError::Session(SessionError::Store(StoreError::Io(_))))
    ));
    assert!(store.deletes_seen.load(Ordering::SeqCst));
    assert!(svc.get_values(&cancel, &a).await.unwrap_err().is_not_found());
    assert!(svc.refresh().get_values(&cancel, &r).await.is_ok());
}

#[tokio::test]
async fn test_invalidate_pair_cancelled_returns_cancelled() {
    let svc = service();
    let cancel = CancellationToken::new();
    let (a, r) = svc
        .init_pair(&cancel, &uid(1), Value::from("p1"))
        .await
        .unwrap();

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let result = svc.invalidate_pair(&cancelled, &a, &r).await;

    assert!(matches!(
        result,
        Err(ServiceError::Session(SessionError::Store(StoreError::Cancelled)))
    ));
    assert_eq!(svc.get_values(&cancel, &a).await.unwrap(), uid(1));
}

// =========================================================================
// Other codecs
// =========================================================================

#[tokio::test]
async fn test_pair_over_bincode_codec() {
    let svc = Service::new(
        Arc::new(MemoryStore::new()),
        BincodeCodec,
        ServiceConfig::default(),
    )
    .unwrap();
    let cancel = CancellationToken::new();

    let (a, r) = svc
        .init_pair(&cancel, &uid(7), Value::Float(f64::INFINITY))
        .await
        .unwrap();
    let a2 = svc
        .request_access(&cancel, &r, &Value::Float(f64::INFINITY))
        .await
        .unwrap();

    assert!(a2.is_some());
    assert_eq!(svc.get_values(&cancel, &a).await.unwrap(), uid(7));
}
