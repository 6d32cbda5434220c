//! Projection of [`CardState`] onto the card's visible surface.

use std::fmt;

use crate::advice::{AdviceRecord, CurrentAdvice, LOADING_TEXT};
use crate::controller::CardState;

pub const LOADING_LABEL: &str = "ADVICE";
pub const ERROR_BANNER: &str = "Network is slow \u{2014} showing saved advice.";

const DIVIDER: &str = "──────────────  ▮▮  ──────────────";

/// What the card shows for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// `ADVICE #<id>`, or `ADVICE` while loading.
    pub label: String,
    /// Quoted advice text, or `Loading`.
    pub text: String,
    pub button_disabled: bool,
    /// The button should announce that work is in progress.
    pub button_busy: bool,
    pub error_banner: Option<&'static str>,
}

impl CardView {
    /// An idle card showing `record`, with no error banner.
    #[must_use]
    pub fn ready(record: &AdviceRecord) -> Self {
        Self {
            label: format!("ADVICE #{}", record.id),
            text: format!("\u{201c}{}\u{201d}", record.text),
            button_disabled: false,
            button_busy: false,
            error_banner: None,
        }
    }
}

impl From<&CardState> for CardView {
    fn from(state: &CardState) -> Self {
        let base = match &state.current {
            CurrentAdvice::Loading => Self {
                label: LOADING_LABEL.to_string(),
                text: LOADING_TEXT.to_string(),
                button_disabled: false,
                button_busy: false,
                error_banner: None,
            },
            CurrentAdvice::Ready(record) => Self::ready(record),
        };
        Self {
            button_disabled: state.loading,
            button_busy: state.loading,
            error_banner: state.error.then_some(ERROR_BANNER),
            ..base
        }
    }
}

impl fmt::Display for CardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        writeln!(f)?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)?;
        writeln!(f, "{DIVIDER}")?;
        if self.button_disabled {
            writeln!(f, "[ rolling... ]")?;
        } else {
            writeln!(f, "[ enter: new advice | q: quit ]")?;
        }
        if let Some(banner) = self.error_banner {
            writeln!(f, "! {banner}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
