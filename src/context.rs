//! Shared context between cases
//!
//! Single-assignment slots written by one case and read by later ones. The
//! suite validates at construction that every reader comes after its writer.

use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Named slots in the shared context
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// Id returned by the first create
    MercadoId,
}

impl ContextKey {
    pub fn name(&self) -> &'static str {
        match self {
            ContextKey::MercadoId => "mercado_id",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContextError {
    #[error("context slot '{0}' was already written")]
    AlreadySet(ContextKey),

    #[error("context slot '{0}' has not been written")]
    Unset(ContextKey),
}

/// Values threaded from earlier cases to later ones
#[derive(Debug, Default)]
pub struct SharedContext {
    mercado_id: OnceLock<Value>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: ContextKey) -> &OnceLock<Value> {
        match key {
            ContextKey::MercadoId => &self.mercado_id,
        }
    }

    /// Write a slot once; a second write is rejected
    pub fn set(&self, key: ContextKey, value: Value) -> Result<(), ContextError> {
        self.slot(key)
            .set(value)
            .map_err(|_| ContextError::AlreadySet(key))
    }

    pub fn get(&self, key: ContextKey) -> Result<&Value, ContextError> {
        self.slot(key).get().ok_or(ContextError::Unset(key))
    }

    pub fn is_set(&self, key: ContextKey) -> bool {
        self.slot(key).get().is_some()
    }
}
