//! Expiring session management for Latchkey.
//!
//! This crate handles the lifecycle of a single class of sessions
//! (for example "access" or "refresh"):
//!
//! 1. **Tokens** — random bearer strings ([`generate_token`])
//! 2. **Records** — a payload and expiry stored under a token
//!    ([`SessionManager`], [`SessionRecord`])
//! 3. **Rotation** — swapping a token for a fresh one that carries the
//!    same payload ([`SessionManager::renew`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Service (above)  ← pairs an access manager with a refresh manager
//!     ↕
//! Session Layer (this crate)  ← tokens, lifetimes, namespaced keys
//!     ↕
//! Codec + Store (below)  ← bytes and where they live
//! ```

mod config;
mod error;
mod manager;
mod token;

pub use config::ManagerConfig;
pub use error::SessionError;
pub use manager::{SessionManager, SessionRecord};
pub use token::{TOKEN_ALPHABET, generate_token};
