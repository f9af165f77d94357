//! mon-receiver
//!
//! Reads telemetry from the ventilator monitor over serial and stores it in
//! InfluxDB.
//!
//! Usage: `mon-receiver [CONFIG] [--print]`
//!
//! With `--print` packets are written to stdout instead of the store.
//! Set `RUST_LOG` to change the log level (default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use mon_receiver_core::pipeline::PacketPrinter;
use mon_receiver_core::prelude::*;
use mon_receiver_core::VERSION;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<PathBuf>,
    print: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: None,
        print: false,
    };
    for arg in std::env::args().skip(1) {
        if arg == "--print" {
            args.print = true;
        } else if args.config.is_none() {
            args.config = Some(PathBuf::from(arg));
        } else {
            warn!("Ignoring extra argument '{}'", arg);
        }
    }
    args
}

fn load_config(explicit: Option<PathBuf>) -> Result<ReceiverConfig> {
    if let Some(path) = explicit {
        return ReceiverConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()));
    }

    match ReceiverConfig::default_path() {
        Some(path) if path.exists() => {
            info!("Using config {}", path.display());
            ReceiverConfig::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        _ => Ok(ReceiverConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args();
    let config = load_config(args.config)?;
    info!("mon-receiver {} starting", VERSION);

    let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut decoder = FrameDecoder::new(diagnostics.clone());
    if args.print {
        decoder.set_listener(Box::new(PacketPrinter));
    } else {
        info!(
            "Storing to {} (database '{}')",
            config.influx.url, config.influx.database
        );
        let sink = Arc::new(TelemetrySink::new(
            config.sink.clone(),
            Arc::new(InfluxConnector::new(config.influx.clone())),
            diagnostics.clone(),
            clock.clone(),
        ));
        sink.run();
        decoder.set_listener(Box::new(sink));
    }

    let mut link = LinkSupervisor::new(
        SystemSerial::new(&config.link),
        config.link.clone(),
        diagnostics,
        clock,
    );
    link.set_listener(Box::new(decoder));
    link.run();

    Ok(())
}
