//! Persisted slot for the last committed advice.
//!
//! DESIGN
//! ======
//! Durable state is a single key in an injected [`KeyValueStore`]. The
//! binary uses [`FileStore`]; tests substitute [`MemoryStore`]. Reads never
//! fail from the caller's point of view: a missing or malformed slot
//! degrades to the fallback advice.

mod file;
mod memory;

use std::sync::Arc;

use tracing::warn;

use crate::advice::AdviceRecord;

pub use file::FileStore;
pub use memory::MemoryStore;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("advice encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

// =============================================================================
// KEY-VALUE STORE
// =============================================================================

/// Minimal string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// =============================================================================
// ADVICE STORE
// =============================================================================

/// Reads and writes the cached advice slot.
#[derive(Clone)]
pub struct AdviceStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl AdviceStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    /// The cached advice, or the fallback when the slot is empty or unreadable.
    #[must_use]
    pub fn load(&self) -> AdviceRecord {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AdviceRecord::fallback(),
            Err(e) => {
                warn!(error = %e, key = %self.key, "cached advice unreadable, using fallback");
                return AdviceRecord::fallback();
            }
        };

        match serde_json::from_str::<AdviceRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, key = %self.key, "cached advice malformed, using fallback");
                AdviceRecord::fallback()
            }
        }
    }

    /// Persist `record` as the last committed advice.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn save(&self, record: &AdviceRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.kv.set(&self.key, &raw)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
