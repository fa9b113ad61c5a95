//! The pool store: the single authoritative table of verified proxies.

use crate::error::PoolResult;
use crate::proxy::{identity_key, ProxyRecord, Scheme};

use log::{error, info, warn};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Records in insertion order plus the identity keys they hold.
#[derive(Debug, Default)]
struct PoolState {
    records: Vec<ProxyRecord>,
    keys: HashSet<String>,
}

impl PoolState {
    /// Append `record` unless its identity key is already present.
    fn insert(&mut self, record: ProxyRecord) -> bool {
        if self.keys.contains(record.key()) {
            return false;
        }
        self.keys.insert(record.key().to_string());
        self.records.push(record);
        true
    }

    fn clear(&mut self) {
        self.records.clear();
        self.keys.clear();
    }
}

/// A process-wide pool of verified proxies mirrored to a JSON file.
///
/// Every operation, read or write, takes the same exclusive lock for its full
/// duration, including the write to disk.
pub struct PoolStore {
    state: Mutex<PoolState>,
    path: PathBuf,
}

impl PoolStore {
    /// Create an empty store mirrored to `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            path: path.into(),
        }
    }

    /// Open the store at `path`, creating the file with `[]` if it does not exist.
    ///
    /// A file that exists but cannot be decoded leaves the pool empty and the
    /// file untouched.
    pub fn open(path: impl Into<PathBuf>) -> PoolResult<Self> {
        let store = Self::new(path);
        let text = match fs::read_to_string(&store.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating empty pool snapshot at {}", store.path.display());
                write_snapshot(&store.path, &[])?;
                return Ok(store);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<String>>(&text) {
            Ok(addresses) => {
                let mut state = store.state.lock();
                for address in addresses.iter().filter(|a| !a.trim().is_empty()) {
                    state.insert(ProxyRecord::from_address(address));
                }
                info!("Loaded {} proxies from {}", state.records.len(), store.path.display());
            }
            Err(e) => {
                warn!("Ignoring unreadable pool snapshot {}: {}", store.path.display(), e);
            }
        }
        Ok(store)
    }

    /// Path of the durable snapshot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A uniformly random member, or `None` when the pool is empty.
    pub fn pick(&self) -> Option<ProxyRecord> {
        let state = self.state.lock();
        if state.records.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..state.records.len());
        Some(state.records[idx].clone())
    }

    /// Address of a uniformly random member, or `None` when the pool is empty.
    pub fn get(&self) -> Option<String> {
        self.pick().map(|record| record.address())
    }

    /// Snapshot of all addresses in insertion order.
    pub fn list(&self) -> Vec<String> {
        let state = self.state.lock();
        state.records.iter().map(ProxyRecord::address).collect()
    }

    /// Identity keys of the current generation, used to resubmit it for validation.
    pub fn candidates(&self) -> Vec<String> {
        let state = self.state.lock();
        state.records.iter().map(|r| r.key().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add unvalidated candidates as `http://host:port`, skipping known keys, then persist.
    ///
    /// Returns how many records were added. A failed write is logged and the
    /// in-memory pool keeps the new entries.
    pub fn merge<S: AsRef<str>>(&self, candidates: &[S]) -> usize {
        let mut state = self.state.lock();
        let mut added = 0;
        for candidate in candidates {
            let key = identity_key(candidate.as_ref());
            if key.is_empty() {
                continue;
            }
            if state.insert(ProxyRecord::new(Scheme::Http, key)) {
                added += 1;
            }
        }
        if let Err(e) = write_snapshot(&self.path, &state.records) {
            error!("Failed to persist pool after merge: {}", e);
        }
        added
    }

    /// Swap in a new generation. Nothing from the previous generation survives
    /// unless it is present in `records`; later duplicates of a key are dropped.
    pub fn replace(&self, records: Vec<ProxyRecord>) -> usize {
        let mut state = self.state.lock();
        let previous = state.records.len();
        state.clear();
        for record in records {
            state.insert(record);
        }
        info!("Pool generation swapped: {} -> {} proxies", previous, state.records.len());
        state.records.len()
    }

    /// Write the current addresses to the durable snapshot.
    pub fn persist(&self) -> PoolResult<()> {
        let state = self.state.lock();
        write_snapshot(&self.path, &state.records)
    }
}

/// Atomically replace `path` with the serialized `records`.
///
/// The bytes are flushed to a temporary sibling before it is renamed over the
/// snapshot, and the directory entry is synced after the rename where the
/// platform allows it. Readers see either the old snapshot or the new one.
fn write_snapshot(path: &Path, records: &[ProxyRecord]) -> PoolResult<()> {
    let addresses: Vec<String> = records.iter().map(ProxyRecord::address).collect();
    let bytes = serde_json::to_vec(&addresses)?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;

    #[cfg(unix)]
    {
        let dir = File::open(parent.unwrap_or_else(|| Path::new(".")))?;
        dir.sync_all()?;
    }
    Ok(())
}
