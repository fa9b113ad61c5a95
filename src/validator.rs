//! Candidate validation against the reference endpoint.

use crate::config::ProxyPoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::proxy::{identity_key, ProxyRecord, Scheme};

use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

/// A single reachability check through one proxy under one scheme.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, proxy: &ProxyRecord) -> PoolResult<()>;
}

/// Probe that fetches the reference page through the proxy and looks for the marker.
pub struct HttpProbe {
    reference_url: String,
    selector: Selector,
    marker: String,
    user_agent: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(config: &ProxyPoolConfig) -> PoolResult<Self> {
        let selector = Selector::parse(&config.marker_selector).map_err(|e| {
            PoolError::parse(format!("invalid marker selector {:?}: {:?}", config.marker_selector, e))
        })?;
        Ok(Self {
            reference_url: config.reference_url.clone(),
            selector,
            marker: config.reference_marker.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
        })
    }

    /// Whether any element matched by the selector contains the marker text.
    pub fn page_has_marker(&self, body: &str) -> bool {
        let document = Html::parse_document(body);
        document
            .select(&self.selector)
            .any(|el| el.text().collect::<String>().contains(&self.marker))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, proxy: &ProxyRecord) -> PoolResult<()> {
        let client = reqwest::Client::builder()
            .proxy(proxy.to_reqwest_proxy()?)
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&self.reference_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;
        debug!("{} answered {} through {}", self.reference_url, response.status(), proxy);
        if response.status() != StatusCode::OK {
            return Err(PoolError::Status(response.status()));
        }

        let body = response.text().await?;
        if self.page_has_marker(&body) {
            Ok(())
        } else {
            Err(PoolError::parse("reference marker not found"))
        }
    }
}

/// Decides whether a raw candidate is a usable proxy.
pub struct Validator {
    probe: Arc<dyn Probe>,
    record_validated_scheme: bool,
}

impl Validator {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        Self {
            probe,
            record_validated_scheme: false,
        }
    }

    /// Validator backed by an `HttpProbe` built from `config`.
    pub fn from_config(config: &ProxyPoolConfig) -> PoolResult<Self> {
        let probe = HttpProbe::new(config)?;
        Ok(Self::new(Arc::new(probe)).record_validated_scheme(config.record_validated_scheme))
    }

    pub fn record_validated_scheme(mut self, enabled: bool) -> Self {
        self.record_validated_scheme = enabled;
        self
    }

    /// Try `http`, `socks5`, then `https`, stopping at the first that works.
    ///
    /// The record is stored as `http://host:port` whichever scheme succeeded,
    /// unless the validator was told to record the validated scheme.
    pub async fn validate(&self, candidate: &str) -> Option<ProxyRecord> {
        let key = identity_key(candidate);
        if key.is_empty() {
            return None;
        }

        for scheme in Scheme::TRIAL_ORDER {
            let attempt = ProxyRecord::new(scheme, key);
            match self.probe.probe(&attempt).await {
                Ok(()) => {
                    let recorded = if self.record_validated_scheme { scheme } else { Scheme::Http };
                    let record = ProxyRecord::new(recorded, key);
                    info!("Proxy {} validated via {}", record, scheme);
                    return Some(record);
                }
                Err(e) => debug!("Probe {} rejected: {}", attempt, e),
            }
        }
        None
    }
}
