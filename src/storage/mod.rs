//! Key-value persistence for last-used form parameters.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::form::FormValues;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key-value storage. Reads never fail; a missing key is `None`.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON view over a [`KvStore`], one stored parameter set per call-site key.
#[derive(Clone)]
pub struct ParamStore {
    backend: Arc<dyn KvStore>,
}

impl ParamStore {
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &Arc<dyn KvStore> {
        &self.backend
    }

    /// Stored parameters for `key`. Anything that is not a JSON object is
    /// treated as a cache miss.
    pub fn load(&self, key: &str) -> Option<FormValues> {
        let raw = self.backend.get(key)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(values)) => Some(values),
            Ok(other) => {
                warn!(key, kind = json_kind(&other), "ignoring stored parameters that are not an object");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "ignoring malformed stored parameters");
                None
            }
        }
    }

    pub fn save(&self, key: &str, values: &FormValues) -> Result<(), StoreError> {
        let raw = serde_json::to_string(values)?;
        self.backend.set(key, &raw)
    }

    pub fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
