//! Store connection supervision

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{StoreConnector, StoreError, StoreSlot};
use crate::clock::Clock;
use crate::diagnostics::{Diagnostic, Diagnostics};

/// Pings the store and replaces dead connections
pub struct ConnectionMonitor {
    slot: StoreSlot,
    connector: Arc<dyn StoreConnector>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl ConnectionMonitor {
    /// Monitor the connection held in `slot`
    pub fn new(
        slot: StoreSlot,
        connector: Arc<dyn StoreConnector>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            slot,
            connector,
            diagnostics,
        }
    }

    /// One health check; reconnects if there is no healthy connection.
    ///
    /// Returns whether a usable connection is installed afterwards.
    pub fn tick(&self) -> bool {
        match self.slot.ping() {
            Ok(()) => return true,
            Err(StoreError::NotConnected) => {}
            Err(err) => self.diagnostics.report(Diagnostic::StoreConnectionFailure(err)),
        }
        self.reconnect()
    }

    /// Replace the current connection with a fresh one
    pub fn reconnect(&self) -> bool {
        match self.connector.connect() {
            Ok(store) => {
                if let Some(old) = self.slot.replace(Some(store)) {
                    old.close();
                }
                self.diagnostics.report(Diagnostic::StoreConnected);
                true
            }
            Err(err) => {
                if let Some(old) = self.slot.replace(None) {
                    old.close();
                }
                self.diagnostics.report(Diagnostic::StoreConnectionFailure(err));
                false
            }
        }
    }

    /// Check every `interval` while `running` stays set
    ///
    /// A cleared flag is only noticed after the current sleep.
    pub fn run_loop(&self, running: &AtomicBool, interval: Duration, clock: &dyn Clock) {
        while running.load(Ordering::Relaxed) {
            self.tick();
            clock.sleep(interval);
        }
    }
}
