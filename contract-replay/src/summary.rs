use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Tally of one replay run. Entries that were skipped count towards `total` only.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            valid: 0,
            invalid: 0,
        }
    }

    pub fn record_valid(&mut self) {
        self.valid += 1;
    }

    pub fn record_invalid(&mut self) {
        self.invalid += 1;
    }

    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.valid + self.invalid)
    }

    /// Every entry was classified and none was invalid.
    pub fn is_clean(&self) -> bool {
        self.invalid == 0 && self.valid == self.total
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Valid: {}, Invalid: {}",
            self.total, self.valid, self.invalid
        )
    }
}
