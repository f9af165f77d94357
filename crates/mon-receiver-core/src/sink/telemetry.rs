//! Telemetry sink
//!
//! Decouples packet arrival from store writes. Packets are stamped and queued
//! on the link thread; a writer thread batches them into the store; a
//! separate health thread keeps the store connection alive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::{
    measurement_queue, BatchWriter, ConnectionMonitor, Measurement, QueueConsumer, QueueError,
    QueueProducer, SinkConfig, StoreConnector, StoreSlot,
};
use crate::clock::Clock;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::pipeline::PacketSink;
use crate::protocol::Packet;

/// Queue + batch writer + connection supervisor in front of a store
pub struct TelemetrySink {
    config: SinkConfig,
    producer: QueueProducer,
    slot: StoreSlot,
    monitor: Arc<ConnectionMonitor>,
    diagnostics: Arc<dyn Diagnostics>,
    clock: Arc<dyn Clock>,
    /// Gates the write loop
    writing: Arc<AtomicBool>,
    writer: Option<JoinHandle<()>>,
    health: Mutex<Option<HealthLoop>>,
}

/// One health thread and the flag only it watches
struct HealthLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl HealthLoop {
    fn is_active(&self) -> bool {
        self.running.load(Ordering::Relaxed) && !self.handle.is_finished()
    }
}

impl TelemetrySink {
    /// Create the sink and start its write loop
    ///
    /// No connection is opened until [`run`](Self::run) starts the health loop;
    /// writes attempted before that fail and are retried.
    pub fn new(
        config: SinkConfig,
        connector: Arc<dyn StoreConnector>,
        diagnostics: Arc<dyn Diagnostics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (producer, consumer) = measurement_queue(config.queue_capacity);
        let slot = StoreSlot::new();
        let monitor = Arc::new(ConnectionMonitor::new(
            slot.clone(),
            connector,
            diagnostics.clone(),
        ));
        let writing = Arc::new(AtomicBool::new(true));

        let writer = {
            let batch = BatchWriter::new(config.batch_size, config.max_pending);
            let slot = slot.clone();
            let diagnostics = diagnostics.clone();
            let writing = writing.clone();
            thread::spawn(move || write_loop(consumer, batch, slot, diagnostics, writing))
        };

        Self {
            config,
            producer,
            slot,
            monitor,
            diagnostics,
            clock,
            writing,
            writer: Some(writer),
            health: Mutex::new(None),
        }
    }

    /// Start the connection-health loop; does nothing if it is already running
    ///
    /// A loop stopped earlier may still be asleep. It keeps its own cleared
    /// flag and exits on waking, while a fresh loop takes over.
    pub fn run(&self) {
        let Ok(mut health) = self.health.lock() else {
            return;
        };
        if health.as_ref().is_some_and(HealthLoop::is_active) {
            return;
        }

        let running = Arc::new(AtomicBool::new(true));
        let monitor = self.monitor.clone();
        let clock = self.clock.clone();
        let interval = self.config.health_interval();
        let flag = running.clone();
        let handle = thread::spawn(move || monitor.run_loop(&flag, interval, clock.as_ref()));
        *health = Some(HealthLoop { running, handle });
    }

    /// Clear both loop flags; each loop exits at its next wake-up
    pub fn stop(&self) {
        self.writing.store(false, Ordering::Relaxed);
        if let Ok(health) = self.health.lock() {
            if let Some(health) = health.as_ref() {
                health.running.store(false, Ordering::Relaxed);
            }
        }
    }

    /// Whether a health loop is running and has not been stopped
    pub fn is_monitoring(&self) -> bool {
        self.health
            .lock()
            .map(|health| health.as_ref().is_some_and(HealthLoop::is_active))
            .unwrap_or(false)
    }

    /// Stamp and enqueue one packet without blocking
    pub fn enqueue(&self, packet: Packet) -> Result<(), QueueError> {
        let measurement = Measurement::from_packet(packet, self.clock.now());
        self.producer.try_push(measurement).inspect_err(|err| {
            let (QueueError::Full(m) | QueueError::Disconnected(m)) = err;
            self.diagnostics.report(Diagnostic::QueueOverflow {
                measurement: m.measurement.clone(),
                time: m.time(),
            });
        })
    }

    /// Measurements queued but not yet picked up by the writer
    pub fn queued(&self) -> usize {
        self.producer.len()
    }

    /// Whether a store connection is installed
    pub fn is_connected(&self) -> bool {
        self.slot.is_connected()
    }

    /// Whether the write loop is still alive
    pub fn is_writing(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for TelemetrySink {
    fn drop(&mut self) {
        // Dropping the producer afterwards wakes a writer blocked on the queue
        self.stop();
        self.writer.take();
    }
}

impl PacketSink for TelemetrySink {
    fn on_packet(&mut self, packet: Packet) {
        let _ = self.enqueue(packet);
    }
}

impl PacketSink for Arc<TelemetrySink> {
    fn on_packet(&mut self, packet: Packet) {
        let _ = self.enqueue(packet);
    }
}

fn write_loop(
    consumer: QueueConsumer,
    mut batch: BatchWriter,
    slot: StoreSlot,
    diagnostics: Arc<dyn Diagnostics>,
    writing: Arc<AtomicBool>,
) {
    while writing.load(Ordering::Relaxed) {
        let Some(measurement) = consumer.pop() else {
            break;
        };
        batch.push(measurement, &slot, diagnostics.as_ref());
    }
}
