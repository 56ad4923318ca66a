use crate::config::TrackerConfig;
use crate::electricity::ElectricityLedger;
use crate::store::KvStore;
use crate::tracker::{TracingRenderer, Tracker, TrackerCheckpoint};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Everything one user session owns: the store and the two engines reading it.
pub struct AppData {
    pub store: KvStore,
    pub tracker: Tracker,
    pub ledger: ElectricityLedger,
}

/// Copy of [`AppData`] taken before a change that still has to reach disk.
pub struct DataCheckpoint {
    store: KvStore,
    tracker: TrackerCheckpoint,
    ledger: ElectricityLedger,
}

impl AppData {
    pub fn load(store: KvStore, config: TrackerConfig) -> Self {
        let ledger = ElectricityLedger::load(&store, config.grid_co2_factor);
        let mut tracker = Tracker::load(&store, config);
        tracker.subscribe(Box::new(TracingRenderer));
        Self {
            store,
            tracker,
            ledger,
        }
    }

    /// Re-reads the ledger after the store was cleared underneath it.
    pub fn reload_ledger(&mut self) {
        self.ledger = ElectricityLedger::load(&self.store, self.ledger.co2_factor());
    }

    pub fn checkpoint(&self) -> DataCheckpoint {
        DataCheckpoint {
            store: self.store.clone(),
            tracker: self.tracker.checkpoint(),
            ledger: self.ledger.clone(),
        }
    }

    /// Drops every in-memory change made since `checkpoint`, so memory matches disk again.
    pub fn rollback(&mut self, checkpoint: DataCheckpoint) {
        self.store = checkpoint.store;
        self.ledger = checkpoint.ledger;
        self.tracker.restore(checkpoint.tracker);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PersistentStore;
    use crate::tracker::Action;

    #[test]
    fn rollback_restores_store_tracker_and_ledger() {
        let mut data = AppData::load(KvStore::new(), TrackerConfig::default());
        data.ledger.set_month(1, 50.0);
        let checkpoint = data.checkpoint();

        data.tracker.dispatch(&mut data.store, Action::Buy).unwrap();
        data.ledger.set_month(1, 75.0);
        data.ledger.save(&mut data.store);
        assert!(!data.store.is_empty());

        data.rollback(checkpoint);
        assert!(data.store.is_empty());
        assert_eq!(data.store.get("boughtCount"), None);
        assert_eq!(data.tracker.metrics().bought_count(), 0);
        assert_eq!(data.ledger.month(1), 50.0);
    }
}
