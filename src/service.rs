//! Service facade exposing add/get/list over the pool store.

use crate::pool::PoolStore;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CODE_OK: u8 = 1;
pub const CODE_ERR: u8 = 2;

/// Uniform response body: `code` 1 on success, 2 on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u8,
    pub message: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_OK,
            message: None,
            data,
        }
    }

    pub fn err(data: T, message: impl Into<String>) -> Self {
        Self {
            code: CODE_ERR,
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Clone)]
pub struct ServiceFacade {
    store: Arc<PoolStore>,
}

impl ServiceFacade {
    pub fn new(store: Arc<PoolStore>) -> Self {
        Self { store }
    }

    /// Merge a JSON array of raw addresses into the live pool without validating them.
    ///
    /// The raw payload is echoed back; a payload that is not a JSON string
    /// array yields an error envelope and leaves the pool alone.
    pub fn add(&self, raw: &str) -> Envelope<String> {
        info!("Add request: {}", raw);
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(addresses) => {
                let added = self.store.merge(&addresses);
                info!("Added {} of {} submitted proxies", added, addresses.len());
                Envelope::ok(raw.to_string())
            }
            Err(e) => {
                warn!("Rejected add payload: {}", e);
                Envelope::err(raw.to_string(), e.to_string())
            }
        }
    }

    /// One random pool address, or an empty string.
    pub fn get(&self) -> Envelope<String> {
        Envelope::ok(self.store.get().unwrap_or_default())
    }

    pub fn list(&self) -> Envelope<Vec<String>> {
        Envelope::ok(self.store.list())
    }
}
