//! Batch accumulation for bulk writes

use super::{Measurement, StoreSlot};
use crate::diagnostics::{Diagnostic, Diagnostics};

/// What a single [`BatchWriter::push`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Below the write threshold, nothing sent
    Pending,
    /// A write of this many points succeeded
    Written(usize),
    /// The write failed; the batch is kept
    WriteFailed,
    /// The batch exceeded its limit and this many points were dropped
    Overflowed(usize),
}

/// Accumulates measurements and flushes them once enough are pending
///
/// A failed write keeps the whole batch, so every later arrival retries with
/// the grown batch until a write succeeds or the limit is passed.
#[derive(Debug)]
pub struct BatchWriter {
    pending: Vec<Measurement>,
    batch_size: usize,
    max_pending: usize,
}

impl BatchWriter {
    /// Write at `batch_size` pending points, drop everything above `max_pending`
    pub fn new(batch_size: usize, max_pending: usize) -> Self {
        Self {
            pending: Vec::with_capacity(batch_size),
            batch_size,
            max_pending,
        }
    }

    /// Points waiting for a successful write
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Add one measurement and write if the batch is full
    pub fn push(
        &mut self,
        measurement: Measurement,
        store: &StoreSlot,
        diagnostics: &dyn Diagnostics,
    ) -> BatchOutcome {
        self.pending.push(measurement);
        let mut outcome = BatchOutcome::Pending;

        if self.pending.len() >= self.batch_size {
            match store.write_points(&self.pending) {
                Ok(()) => {
                    outcome = BatchOutcome::Written(self.pending.len());
                    self.pending.clear();
                }
                Err(source) => {
                    diagnostics.report(Diagnostic::StoreWriteFailure {
                        pending: self.pending.len(),
                        source,
                    });
                    outcome = BatchOutcome::WriteFailed;
                }
            }
        }

        if self.pending.len() > self.max_pending {
            let dropped = self.pending.len();
            self.pending.clear();
            diagnostics.report(Diagnostic::BatchOverflow { dropped });
            outcome = BatchOutcome::Overflowed(dropped);
        }

        outcome
    }
}
