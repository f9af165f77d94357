//! # mon-receiver Core Library
//!
//! Core functionality for the ventilator monitor's serial receiver.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial link discovery, probing and supervision
//! - COBS frame recovery and CRC-checked packet decoding
//! - Buffered, batched delivery of measurements to a time-series store
//! - An InfluxDB 1.x store client with connection-health supervision
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mon_receiver_core::prelude::*;
//!
//! let config = ReceiverConfig::default();
//! let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!
//! let sink = TelemetrySink::new(
//!     config.sink.clone(),
//!     Arc::new(InfluxConnector::new(config.influx.clone())),
//!     diagnostics.clone(),
//!     clock.clone(),
//! );
//! sink.run();
//!
//! let mut decoder = FrameDecoder::new(diagnostics.clone());
//! decoder.set_listener(Box::new(sink));
//!
//! let mut link = LinkSupervisor::new(
//!     SystemSerial::new(&config.link),
//!     config.link.clone(),
//!     diagnostics,
//!     clock,
//! );
//! link.set_listener(Box::new(decoder));
//! link.run();
//! ```

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod link;
pub mod pipeline;
pub mod protocol;
pub mod sink;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{ConfigError, ReceiverConfig};
    pub use crate::diagnostics::{
        Diagnostic, DiagnosticKind, Diagnostics, MemoryDiagnostics, TracingDiagnostics,
    };
    pub use crate::link::{LinkConfig, LinkStatus, LinkSupervisor, SerialBackend, SystemSerial};
    pub use crate::pipeline::{PacketSink, RawDataSink};
    pub use crate::protocol::{FrameDecoder, Packet, ProtocolError};
    pub use crate::sink::{
        InfluxConfig, InfluxConnector, Measurement, SinkConfig, StoreConnector, StoreError,
        TelemetrySink, TimeSeriesStore,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
