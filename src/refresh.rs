//! The perpetual refresh loop producing one pool generation per cycle.

use crate::aggregator::{Aggregator, Generation};
use crate::pool::PoolStore;
use crate::sources::SourceAdapter;

use log::{error, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time;

pub struct RefreshLoop {
    store: Arc<PoolStore>,
    aggregator: Arc<Aggregator>,
    sources: Vec<Arc<dyn SourceAdapter>>,
    interval: Duration,
}

impl RefreshLoop {
    pub fn new(
        store: Arc<PoolStore>,
        aggregator: Arc<Aggregator>,
        sources: Vec<Arc<dyn SourceAdapter>>,
    ) -> Self {
        Self {
            store,
            aggregator,
            sources,
            interval: Duration::ZERO,
        }
    }

    /// Pause between cycles. Zero runs them back to back.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one cycle: re-validate the current pool, harvest every source,
    /// then swap in the survivors and persist them. Returns the new pool size.
    pub async fn run_cycle(&self) -> usize {
        let started = Instant::now();
        let mut generation = Generation::new();

        let current = self.store.candidates();
        info!("Re-validating {} pooled proxies", current.len());
        self.aggregator.dispatch(current, &mut generation).await;

        for source in &self.sources {
            let candidates = self.aggregator.harvest(source.as_ref()).await;
            self.aggregator.dispatch(candidates, &mut generation).await;
        }

        info!("All sources harvested, waiting on {} validations", generation.pending());
        let survivors = generation.finish().await;
        let size = self.store.replace(survivors);
        if let Err(e) = self.store.persist() {
            error!("Failed to persist pool to {}: {}", self.store.path().display(), e);
        }
        info!("Refresh cycle finished in {:?}: {} proxies", started.elapsed(), size);
        size
    }

    /// Refresh forever.
    pub async fn run(self) {
        loop {
            self.run_cycle().await;
            if !self.interval.is_zero() {
                time::sleep(self.interval).await;
            }
        }
    }

    /// Start the loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
