//! Run context: values extracted by earlier steps
//!
//! The context only grows. Each key is written once; a second write is
//! rejected rather than silently replacing an earlier step's output.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::common::{Error, Result};

use super::path;

/// Ordered copy of a context, as stored in an [`Outcome`](super::Outcome)
pub type ContextSnapshot = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RunContext {
    values: BTreeMap<String, Value>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from seed values, rejecting duplicate keys
    pub fn seeded<I, K>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut ctx = Self::new();
        for (key, value) in values {
            ctx.insert(key, value)?;
        }
        Ok(ctx)
    }

    /// Record a value; fails if the key already exists
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if self.values.contains_key(&key) {
            return Err(Error::DuplicateContextKey(key));
        }
        self.values.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value as text for paths and headers
    ///
    /// Fails if the key is absent or holds a non-scalar value.
    pub fn text(&self, key: &str) -> Result<String> {
        self.get(key)
            .and_then(path::as_text)
            .ok_or_else(|| Error::MissingContextValue(key.to_string()))
    }

    /// Raw JSON value, or an error naming the key
    pub fn value(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| Error::MissingContextValue(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        self.values.clone()
    }
}
