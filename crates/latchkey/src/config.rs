//! Service configuration: one manager config per token class.

use std::time::Duration;

use latchkey_session::ManagerConfig;
use serde::{Deserialize, Deserializer, Serialize};

/// Configuration for a [`Service`](crate::Service).
///
/// The two halves usually share one store, so their key prefixes must
/// differ; [`Service::new`](crate::Service::new) rejects a config where
/// they don't.
///
/// When deserializing, a half that is present but incomplete is filled in
/// from that half's own defaults ([`ServiceConfig::default_access`] or
/// [`ServiceConfig::default_refresh`]), not from `ManagerConfig::default()`.
/// Overriding only the token lengths therefore keeps the prefixes apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Short-lived sessions that carry the payload.
    #[serde(
        default = "ServiceConfig::default_access",
        deserialize_with = "access_half"
    )]
    pub access: ManagerConfig,

    /// Long-lived sessions that carry the payload and the proof.
    #[serde(
        default = "ServiceConfig::default_refresh",
        deserialize_with = "refresh_half"
    )]
    pub refresh: ManagerConfig,
}

impl ServiceConfig {
    /// 32-character tokens, 20 minutes, prefix `"access:"`.
    pub fn default_access() -> ManagerConfig {
        ManagerConfig {
            token_length: 32,
            lifetime: Duration::from_secs(20 * 60),
            key_prefix: "access:".to_string(),
        }
    }

    /// 48-character tokens, 20 days, prefix `"refresh:"`.
    pub fn default_refresh() -> ManagerConfig {
        ManagerConfig {
            token_length: 48,
            lifetime: Duration::from_secs(20 * 24 * 60 * 60),
            key_prefix: "refresh:".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            access: Self::default_access(),
            refresh: Self::default_refresh(),
        }
    }
}

/// The fields of one half as they appear in a config file, each optional.
#[derive(Deserialize)]
struct HalfOverrides {
    token_length: Option<usize>,
    lifetime: Option<Duration>,
    key_prefix: Option<String>,
}

impl HalfOverrides {
    fn apply(self, mut base: ManagerConfig) -> ManagerConfig {
        if let Some(token_length) = self.token_length {
            base.token_length = token_length;
        }
        if let Some(lifetime) = self.lifetime {
            base.lifetime = lifetime;
        }
        if let Some(key_prefix) = self.key_prefix {
            base.key_prefix = key_prefix;
        }
        base
    }
}

fn access_half<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ManagerConfig, D::Error> {
    Ok(HalfOverrides::deserialize(deserializer)?
        .apply(ServiceConfig::default_access()))
}

fn refresh_half<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ManagerConfig, D::Error> {
    Ok(HalfOverrides::deserialize(deserializer)?
        .apply(ServiceConfig::default_refresh()))
}
