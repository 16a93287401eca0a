//! The generic value model carried by sessions.
//!
//! Session payloads are application data the library never interprets:
//! a user id, a role name, a nested map of preferences. Rather than using
//! ambient dynamic typing we model them as a tagged union, so every value
//! knows its own kind and equality is structural.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The key-value data attached to a session.
///
/// A `BTreeMap` keeps keys sorted, so the same payload always encodes to
/// the same bytes no matter what order entries were inserted in.
pub type Payload = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single dynamically-typed value inside a [`Payload`].
///
/// Equality is structural: two values are equal when they are the same
/// variant with equal contents, recursively. Kinds never compare equal
/// across variants, so `Value::Int(1) != Value::Float(1.0)`.
///
/// Serde uses the default external tagging (`{"Int":7}` in JSON), which
/// keeps the variant visible on the wire and lets the record round-trip
/// with its types intact.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Payload),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer if this is a [`Value::Int`]. Floats are not
    /// converted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the inner map if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&Payload> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes the value and returns the inner map, if it is one.
    pub fn into_map(self) -> Option<Payload> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` if this value, or anything nested inside it, is a
    /// NaN or infinite float.
    pub fn has_non_finite(&self) -> bool {
        match self {
            Self::Float(n) => !n.is_finite(),
            Self::List(items) => items.iter().any(Value::has_non_finite),
            Self::Map(map) => map.values().any(Value::has_non_finite),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Payload> for Value {
    fn from(map: Payload) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}
