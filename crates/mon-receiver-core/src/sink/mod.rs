//! Store Delivery
//!
//! Queues validated packets as timestamped measurements, writes them to a
//! time-series store in batches and keeps the store connection healthy.

mod batch;
mod error;
mod health;
pub mod influx;
mod measurement;
mod queue;
mod store;
mod telemetry;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use batch::{BatchOutcome, BatchWriter};
pub use error::{QueueError, StoreError};
pub use health::ConnectionMonitor;
pub use influx::{InfluxConfig, InfluxConnector, InfluxStore};
pub use measurement::{Measurement, TIME_FORMAT};
pub use queue::{measurement_queue, QueueConsumer, QueueProducer};
pub use store::{StoreConnector, StoreSlot, TimeSeriesStore};
pub use telemetry::TelemetrySink;

/// Default queue capacity between the link thread and the writer
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default number of points per bulk write
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pending points above which the batch is discarded
pub const DEFAULT_MAX_PENDING: usize = 500;

/// Default interval between store pings, in milliseconds
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = 1000;

/// Sink configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Measurements the queue holds before dropping
    pub queue_capacity: usize,
    /// Points per bulk write
    pub batch_size: usize,
    /// Pending points above which the batch is discarded
    pub max_pending: usize,
    /// Interval between store pings, in milliseconds
    pub health_interval_ms: u64,
}

impl SinkConfig {
    /// Interval between store pings
    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            max_pending: DEFAULT_MAX_PENDING,
            health_interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
        }
    }
}
