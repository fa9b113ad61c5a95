//! Harvests candidates from sources and validates them under a shared admission gate.

use crate::config::ProxyPoolConfig;
use crate::proxy::ProxyRecord;
use crate::sources::SourceAdapter;
use crate::validator::Validator;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use parking_lot::Mutex;
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Survivors of one refresh cycle, plus the validations still running for it.
pub struct Generation {
    survivors: Arc<Mutex<Vec<ProxyRecord>>>,
    tasks: FuturesUnordered<JoinHandle<()>>,
}

impl Generation {
    pub fn new() -> Self {
        Self {
            survivors: Arc::new(Mutex::new(Vec::new())),
            tasks: FuturesUnordered::new(),
        }
    }

    /// Validations dispatched and not yet finished.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every dispatched validation, then hand back the survivors in completion order.
    pub async fn finish(mut self) -> Vec<ProxyRecord> {
        while let Some(joined) = self.tasks.next().await {
            if let Err(e) = joined {
                error!("Validation task failed: {}", e);
            }
        }
        std::mem::take(&mut *self.survivors.lock())
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives source adapters and the validator.
pub struct Aggregator {
    validator: Arc<Validator>,
    gate: Arc<Semaphore>,
    client: ClientWithMiddleware,
    retry_count: usize,
    max_pages: u32,
}

impl Aggregator {
    pub fn new(validator: Validator, client: ClientWithMiddleware, config: &ProxyPoolConfig) -> Self {
        Self {
            validator: Arc::new(validator),
            gate: Arc::new(Semaphore::new(config.max_concurrent_validations)),
            client,
            retry_count: config.retry_count,
            max_pages: config.max_pages,
        }
    }

    /// Collect every candidate `source` offers.
    ///
    /// Each page gets `retry_count` attempts; a page that still fails, or that
    /// parses to nothing, ends the walk for this source.
    pub async fn harvest(&self, source: &dyn SourceAdapter) -> Vec<String> {
        let last_page = if source.paginated() { self.max_pages } else { 1 };
        let mut candidates = Vec::new();

        for page in 1..=last_page {
            let rows = self.fetch_with_retry(source, page).await;
            if rows.is_empty() {
                break;
            }
            candidates.extend(rows);
        }

        info!("Harvested {} candidates from {}", candidates.len(), source.name());
        candidates
    }

    async fn fetch_with_retry(&self, source: &dyn SourceAdapter, page: u32) -> Vec<String> {
        for attempt in 1..=self.retry_count {
            let result = match source.fetch_page(&self.client, page).await {
                Ok(body) => source.parse(&body),
                Err(e) => Err(e),
            };
            match result {
                Ok(rows) => return rows,
                Err(e) if e.is_transport() => warn!(
                    "{} page {} attempt {}/{} failed: {}",
                    source.name(),
                    page,
                    attempt,
                    self.retry_count,
                    e
                ),
                // the site answered, but its layout no longer matches the adapter
                Err(e) => error!(
                    "{} page {} attempt {}/{} unparseable: {}",
                    source.name(),
                    page,
                    attempt,
                    self.retry_count,
                    e
                ),
            }
        }
        Vec::new()
    }

    /// Start validating `candidates` into `generation`.
    ///
    /// Waits for a gate permit before each spawn, so this returns once the last
    /// candidate has been admitted, not once it has been validated.
    pub async fn dispatch(&self, candidates: Vec<String>, generation: &mut Generation) {
        for candidate in candidates {
            let permit = match Arc::clone(&self.gate).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Admission gate closed: {}", e);
                    return;
                }
            };
            let validator = Arc::clone(&self.validator);
            let survivors = Arc::clone(&generation.survivors);
            generation.tasks.push(tokio::spawn(async move {
                let _permit = permit;
                if let Some(record) = validator.validate(&candidate).await {
                    survivors.lock().push(record);
                }
            }));
        }
    }

    /// Validate `candidates` and wait for the outcome.
    pub async fn validate_all(&self, candidates: Vec<String>) -> Vec<ProxyRecord> {
        let mut generation = Generation::new();
        self.dispatch(candidates, &mut generation).await;
        generation.finish().await
    }
}
