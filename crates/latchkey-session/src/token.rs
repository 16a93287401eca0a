//! Random bearer tokens.
//!
//! A token is the only thing a client holds, so guessing one must be
//! infeasible. Each character is one of 62 alphanumerics, worth about
//! 5.95 bits of entropy; the default 32-character access token carries
//! roughly 190 bits.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::SessionError;

/// The characters a token is drawn from.
///
/// No separators, so a key prefix such as `"refresh:"` can never be
/// reproduced by a token.
pub const TOKEN_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of 62 that fits in a byte. Bytes at or above it are
/// rejected so that `byte % 62` stays uniform.
const ACCEPT_BELOW: u8 = 248;

/// Generates a token of `length` characters drawn uniformly from
/// [`TOKEN_ALPHABET`].
///
/// Randomness comes straight from the operating system (`OsRng`). Tokens
/// are not checked against existing store keys; at the lengths this is
/// used with, a collision is not a practical concern.
///
/// # Errors
/// - [`SessionError::InvalidLength`] if `length` is 0.
/// - [`SessionError::TokenGen`] if the OS random source fails.
pub fn generate_token(length: usize) -> Result<String, SessionError> {
    if length < 1 {
        return Err(SessionError::InvalidLength(length));
    }

    let mut rng = OsRng;
    let mut token = String::with_capacity(length);
    let mut buf = [0u8; 64];

    while token.len() < length {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| SessionError::TokenGen(e.to_string()))?;

        for &byte in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
            let idx = usize::from(byte % 62);
            token.push(char::from(TOKEN_ALPHABET[idx]));
            if token.len() == length {
                break;
            }
        }
    }

    Ok(token)
}
