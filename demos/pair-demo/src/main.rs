//! Walks one access/refresh pair through its whole life.
//!
//! ```text
//! RUST_LOG=debug cargo run -p pair-demo [service-config.json]
//! ```
//!
//! Without an argument the default `ServiceConfig` is used.

use std::sync::Arc;

use latchkey::prelude::*;
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(ServiceConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let service = Service::new(Arc::new(MemoryStore::new()), JsonCodec, config)?;
    let cancel = CancellationToken::new();

    // Login.
    let user = Payload::from([
        ("uid".to_string(), Value::Int(7)),
        ("role".to_string(), Value::from("editor")),
    ]);
    let proof = Value::from("client-fingerprint");
    let (access, refresh) = service.init_pair(&cancel, &user, proof.clone()).await?;
    tracing::info!(payload = ?service.get_values(&cancel, &access).await?, "logged in");

    // Access token expired client-side: trade the refresh token for a new one.
    match service.request_access(&cancel, &refresh, &proof).await? {
        Some(_) => tracing::info!("new access token issued"),
        None => tracing::warn!("refresh rejected"),
    }
    let rejected = service
        .request_access(&cancel, &refresh, &Value::from("someone-else"))
        .await?;
    tracing::info!(accepted = rejected.is_some(), "request with the wrong proof");

    // Promote the user; both halves of the pair follow.
    let mut promoted = user.clone();
    promoted.insert("role".to_string(), Value::from("admin"));
    service.set_values(&cancel, &access, &promoted).await?;

    // Rotate the pair, then log out.
    let (access, refresh) = service.renew_pair(&cancel, &access, &refresh).await?;
    tracing::info!(payload = ?service.get_values(&cancel, &access).await?, "pair rotated");

    service.invalidate_pair(&cancel, &access, &refresh).await?;
    match service.get_values(&cancel, &access).await {
        Err(e) if e.is_not_found() => tracing::info!("logged out"),
        other => tracing::warn!(?other, "session survived logout"),
    }

    Ok(())
}
