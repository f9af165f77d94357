//! Pipeline stage contracts
//!
//! Each stage pushes its output into exactly one downstream listener. A stage
//! without a listener still does its work and discards the result.

use std::sync::{Arc, Mutex};

use crate::protocol::Packet;

/// Receives raw byte chunks read from the serial link
pub trait RawDataSink: Send {
    /// Called once per successful read, on the link thread
    fn on_data(&mut self, chunk: &[u8]);
}

/// Receives fully validated packets from the frame decoder
pub trait PacketSink: Send {
    /// Called once per valid packet, on the link thread
    fn on_packet(&mut self, packet: Packet);
}

/// Packet listener that writes each packet to stdout
#[derive(Debug, Default)]
pub struct PacketPrinter;

impl PacketSink for PacketPrinter {
    fn on_packet(&mut self, packet: Packet) {
        println!("{}", packet);
    }
}

/// Packet listener that keeps every packet in a shared list
#[derive(Debug, Clone, Default)]
pub struct PacketCollector {
    packets: Arc<Mutex<Vec<Packet>>>,
}

impl PacketCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the packets received so far, in arrival order
    pub fn packets(&self) -> Vec<Packet> {
        self.packets
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of packets received so far
    pub fn len(&self) -> usize {
        self.packets.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Whether no packet has been received yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PacketSink for PacketCollector {
    fn on_packet(&mut self, packet: Packet) {
        if let Ok(mut packets) = self.packets.lock() {
            packets.push(packet);
        }
    }
}
