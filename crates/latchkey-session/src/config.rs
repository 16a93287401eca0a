//! Session manager configuration.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::SessionError;

// ---------------------------------------------------------------------------
// ManagerConfig
// ---------------------------------------------------------------------------

/// Configuration for one [`SessionManager`](crate::SessionManager).
///
/// Every manager gets its own explicit config; there is no process-wide
/// default manager. `Serialize`/`Deserialize` let the config be loaded
/// from a file alongside the rest of an application's settings, and
/// `#[serde(default)]` fills in missing fields from [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Number of characters in each generated token. Must be at least 1.
    pub token_length: usize,

    /// How long a session stays readable after it is created or its
    /// values are written. Must be non-zero.
    pub lifetime: Duration,

    /// Prepended to every token to form the store key, so several
    /// managers can share one store without colliding.
    pub key_prefix: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            token_length: 32,
            lifetime: Duration::from_secs(20 * 60),
            key_prefix: "session:".to_string(),
        }
    }
}

impl ManagerConfig {
    /// Sets the token length.
    pub fn with_token_length(mut self, token_length: usize) -> Self {
        self.token_length = token_length;
        self
    }

    /// Sets the session lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets the store key prefix.
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Checks the config and returns the lifetime as a `chrono` delta,
    /// ready to add to `Utc::now()`.
    ///
    /// # Errors
    /// - [`SessionError::InvalidLength`] if `token_length` is 0.
    /// - [`SessionError::InvalidConfig`] if `lifetime` is zero or too
    ///   large to represent as a timestamp offset.
    pub fn validate(&self) -> Result<TimeDelta, SessionError> {
        if self.token_length < 1 {
            return Err(SessionError::InvalidLength(self.token_length));
        }
        if self.lifetime.is_zero() {
            return Err(SessionError::InvalidConfig(
                "lifetime must be greater than zero".into(),
            ));
        }
        TimeDelta::from_std(self.lifetime).map_err(|_| {
            SessionError::InvalidConfig(format!(
                "lifetime {:?} is out of range",
                self.lifetime
            ))
        })
    }
}
