//! Store contract and the shared connection slot

use std::sync::{Arc, RwLock};

use super::{Measurement, StoreError};

/// A time-series store connection
pub trait TimeSeriesStore: Send + Sync {
    /// Write an ordered batch of measurements
    fn write_points(&self, points: &[Measurement]) -> Result<(), StoreError>;

    /// Check that the store answers
    fn ping(&self) -> Result<(), StoreError>;

    /// Release the connection; later calls may fail
    fn close(&self) {}
}

/// Opens new store connections
pub trait StoreConnector: Send + Sync {
    /// Open a fresh connection
    fn connect(&self) -> Result<Arc<dyn TimeSeriesStore>, StoreError>;
}

/// Connection shared between the write loop and the health loop
///
/// The health loop swaps connections in and out; the write loop clones the
/// current one and never holds the lock while talking to the store.
#[derive(Clone, Default)]
pub struct StoreSlot {
    current: Arc<RwLock<Option<Arc<dyn TimeSeriesStore>>>>,
}

impl StoreSlot {
    /// Empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot already holding a connection
    pub fn with_store(store: Arc<dyn TimeSeriesStore>) -> Self {
        let slot = Self::new();
        slot.replace(Some(store));
        slot
    }

    /// The connection in use, if any
    pub fn current(&self) -> Option<Arc<dyn TimeSeriesStore>> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }

    /// Install `store`, returning the previous connection
    pub fn replace(
        &self,
        store: Option<Arc<dyn TimeSeriesStore>>,
    ) -> Option<Arc<dyn TimeSeriesStore>> {
        match self.current.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, store),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), store),
        }
    }

    /// Whether a connection is installed
    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    /// Write through the current connection
    pub fn write_points(&self, points: &[Measurement]) -> Result<(), StoreError> {
        self.current()
            .ok_or(StoreError::NotConnected)?
            .write_points(points)
    }

    /// Ping through the current connection
    pub fn ping(&self) -> Result<(), StoreError> {
        self.current().ok_or(StoreError::NotConnected)?.ping()
    }
}

impl std::fmt::Debug for StoreSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSlot")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl TimeSeriesStore for Nop {
        fn write_points(&self, _points: &[Measurement]) -> Result<(), StoreError> {
            Ok(())
        }

        fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_slot_is_not_connected() {
        let slot = StoreSlot::new();
        assert!(!slot.is_connected());
        assert!(matches!(slot.ping(), Err(StoreError::NotConnected)));
        assert!(matches!(slot.write_points(&[]), Err(StoreError::NotConnected)));
    }

    #[test]
    fn test_replace_is_visible_to_clones() {
        let slot = StoreSlot::new();
        let writer_view = slot.clone();

        assert!(slot.replace(Some(Arc::new(Nop))).is_none());
        assert!(writer_view.ping().is_ok());

        assert!(slot.replace(None).is_some());
        assert!(!writer_view.is_connected());
    }
}
