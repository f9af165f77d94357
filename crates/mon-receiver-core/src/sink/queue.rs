//! Bounded measurement queue
//!
//! The only hand-off between the link thread and the store writer. Pushing
//! never blocks; a full queue rejects the measurement.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use super::{Measurement, QueueError};

/// Create a queue holding at most `capacity` measurements
pub fn measurement_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = channel::bounded(capacity);
    (QueueProducer { tx }, QueueConsumer { rx })
}

/// Sending half, owned by the sink
#[derive(Debug, Clone)]
pub struct QueueProducer {
    tx: Sender<Measurement>,
}

impl QueueProducer {
    /// Enqueue without waiting
    pub fn try_push(&self, measurement: Measurement) -> Result<(), QueueError> {
        self.tx.try_send(measurement).map_err(|e| match e {
            TrySendError::Full(m) => QueueError::Full(m),
            TrySendError::Disconnected(m) => QueueError::Disconnected(m),
        })
    }

    /// Measurements currently waiting
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Receiving half, owned by the write loop
#[derive(Debug)]
pub struct QueueConsumer {
    rx: Receiver<Measurement>,
}

impl QueueConsumer {
    /// Wait for the next measurement
    ///
    /// `None` once every producer is gone and the queue is drained.
    pub fn pop(&self) -> Option<Measurement> {
        self.rx.recv().ok()
    }

    /// Take a measurement if one is waiting
    pub fn try_pop(&self) -> Option<Measurement> {
        self.rx.try_recv().ok()
    }

    /// Measurements currently waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
