//! # live-proxy-pool
//!
//! A continuously refreshed pool of working public proxies.
//!
//! Candidates are harvested from free proxy sites, proven against a reference
//! page through `http`, `socks5` and `https` under a bounded number of
//! concurrent probes, and swapped into the pool one generation at a time. The
//! pool is mirrored to a JSON file and served over HTTP (`/add`, `/get`,
//! `/list`) and as a reqwest middleware.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pool;
pub mod proxy;
pub mod refresh;
pub mod server;
pub mod service;
pub mod sources;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use aggregator::{Aggregator, Generation};
pub use config::{ProxyPoolConfig, ProxyPoolConfigBuilder};
pub use error::{PoolError, PoolResult};
pub use middleware::{source_client, ProxyPoolMiddleware};
pub use pool::PoolStore;
pub use proxy::{identity_key, ProxyRecord, Scheme};
pub use refresh::RefreshLoop;
pub use service::{Envelope, ServiceFacade};
pub use sources::{default_sources, SourceAdapter};
pub use validator::{HttpProbe, Probe, Validator};
