//! Extraction options.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Entities processed between two progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 2000;

/// Options shared by coordinate resolution and record reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractOptions {
    /// Log progress every this many entities (0 disables progress logging).
    pub progress_interval: usize,
    /// Fail on the first record that is out of position instead of searching
    /// the batch for it.
    pub strict_ordering: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            strict_ordering: false,
        }
    }
}

impl ExtractOptions {
    /// Require records to arrive in the same order as the coordinates.
    pub fn strict(mut self) -> Self {
        self.strict_ordering = true;
        self
    }

    /// Set the progress logging interval.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Log a progress line when `done` hits the interval.
    pub(crate) fn report_progress(&self, what: &str, done: usize, total: usize) {
        if self.progress_interval > 0 && done > 0 && done % self.progress_interval == 0 {
            log::info!("{what}: {done} of {total}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.progress_interval, 2000);
        assert!(!opts.strict_ordering);
        assert!(opts.strict().strict_ordering);
    }
}
