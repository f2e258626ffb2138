//! Wrappers around the two external executables.
//!
//! ripkit depends only on exit success/failure of the wrapped tools; all
//! argument construction lives in pure functions so it can be tested
//! without spawning anything.

pub mod lazyripent;
pub mod ripent;

use crate::output::{plural, Printer};

/// Success/failure tally for batch operations.
///
/// Batch operations never abort on the first failure; they process every
/// item and report a summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded == 0 && self.failed == 0
    }

    /// Print the standard summary lines for a finished batch.
    pub fn report(&self, printer: &Printer, singular: &str, pluralized: &str) {
        if self.succeeded > 0 {
            printer.success(
                "Finished",
                &format!("{} processed", plural(self.succeeded, singular, pluralized)),
            );
        }
        if self.failed > 0 {
            printer.warning(
                "Failed",
                &format!("{} failed to process", plural(self.failed, singular, pluralized)),
            );
        }
    }
}
