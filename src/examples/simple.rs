//! Run a single refresh cycle and send a request through the resulting pool.

use live_proxy_pool::{
    default_sources, source_client, Aggregator, PoolStore, ProxyPoolConfig, ProxyPoolMiddleware,
    RefreshLoop, Validator,
};
use reqwest_middleware::ClientBuilder;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ProxyPoolConfig::builder()
        .data_path("simple-pool.json")
        .timeout(Duration::from_secs(5))
        .max_concurrent_validations(32)
        .build();

    let store = Arc::new(PoolStore::open(&config.data_path)?);
    let aggregator = Aggregator::new(
        Validator::from_config(&config)?,
        source_client(Arc::clone(&store), &config)?,
        &config,
    );

    println!("Refreshing proxy pool...");
    let refresh = RefreshLoop::new(Arc::clone(&store), Arc::new(aggregator), default_sources());
    let size = refresh.run_cycle().await;
    println!("{} working proxies:", size);
    for address in store.list() {
        println!("  {}", address);
    }

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::new(Arc::clone(&store), config.timeout))
        .build();

    println!("Sending request...");
    let response = client.get("https://httpbin.org/ip").send().await?;

    println!("Status: {}", response.status());
    println!("Response: {}", response.text().await?);

    Ok(())
}
