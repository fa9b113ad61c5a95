//! Middleware that routes reqwest traffic through a random pool member.

use crate::config::ProxyPoolConfig;
use crate::pool::PoolStore;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Error, Middleware, Next, Result};
use std::sync::Arc;
use std::time::Duration;

/// Sends each request through a proxy picked at random from the pool.
///
/// While the pool is empty requests go out directly. Failures are returned to
/// the caller as-is; retrying is left to whoever issued the request.
#[derive(Clone)]
pub struct ProxyPoolMiddleware {
    /// The proxy pool.
    store: Arc<PoolStore>,
    timeout: Duration,
}

impl ProxyPoolMiddleware {
    pub fn new(store: Arc<PoolStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl Middleware for ProxyPoolMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<reqwest::Response> {
        let Some(proxy) = self.store.pick() else {
            debug!("Pool empty, sending {} directly", req.url());
            return next.run(req, extensions).await;
        };

        debug!("Routing {} through {}", req.url(), proxy);
        let client = reqwest::Client::builder()
            .proxy(proxy.to_reqwest_proxy().map_err(Error::Reqwest)?)
            .timeout(self.timeout)
            .build()
            .map_err(Error::Reqwest)?;

        client.execute(req).await.map_err(|err| {
            warn!("Request through proxy {} failed: {}", proxy, err);
            Error::Reqwest(err)
        })
    }
}

/// Client used to fetch source pages, optionally routed through the pool.
pub fn source_client(
    store: Arc<PoolStore>,
    config: &ProxyPoolConfig,
) -> std::result::Result<ClientWithMiddleware, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()?;
    let builder = ClientBuilder::new(client);
    let builder = if config.route_sources_through_pool {
        builder.with(ProxyPoolMiddleware::new(store, config.timeout))
    } else {
        builder
    };
    Ok(builder.build())
}
