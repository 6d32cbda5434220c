//! Advice records and the value the card currently shows.
//!
//! DESIGN
//! ======
//! The remote service identifies each advice with an integer `id`. The card
//! also needs a "loading" placeholder. It is its own variant of
//! [`CurrentAdvice`] rather than a record with a reserved id, so only real
//! records can reach the persisted slot.

use serde::{Deserialize, Serialize};

/// Text shown when nothing better is available.
pub const FALLBACK_TEXT: &str = "Good things take time \u{2014} but apps shouldn\u{2019}t.";

/// Text shown in place of advice while a request cycle is running.
pub const LOADING_TEXT: &str = "Loading";

// =============================================================================
// ADVICE RECORD
// =============================================================================

/// One piece of advice. Serializes as `{"id": .., "advice": ..}`, matching
/// both the remote payload and the persisted slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceRecord {
    pub id: u64,
    #[serde(rename = "advice")]
    pub text: String,
}

impl AdviceRecord {
    #[must_use]
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self { id, text: text.into() }
    }

    /// The hardcoded record used when neither the cache nor the network
    /// produced anything.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(0, FALLBACK_TEXT)
    }
}

// =============================================================================
// CURRENT ADVICE
// =============================================================================

/// What the card shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentAdvice {
    /// A request cycle is in progress.
    Loading,
    Ready(AdviceRecord),
}

impl CurrentAdvice {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The shown record, or `None` while loading.
    #[must_use]
    pub fn record(&self) -> Option<&AdviceRecord> {
        match self {
            Self::Loading => None,
            Self::Ready(record) => Some(record),
        }
    }
}

impl From<AdviceRecord> for CurrentAdvice {
    fn from(record: AdviceRecord) -> Self {
        Self::Ready(record)
    }
}

#[cfg(test)]
#[path = "advice_test.rs"]
mod tests;
