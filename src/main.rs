use anyhow::Result;
use clap::Parser;
use live_proxy_pool::{
    default_sources, server, source_client, Aggregator, PoolStore, ProxyPoolConfig, RefreshLoop,
    ServiceFacade, Validator,
};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Harvest, validate and serve a live pool of public proxies.
#[derive(Parser)]
#[command(name = "live-proxy-pool", version)]
struct Cli {
    /// File the pool is mirrored to
    #[arg(long, default_value = "data.json")]
    data_path: PathBuf,
    /// Address the HTTP service binds to
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,
    /// Maximum validations in flight
    #[arg(long, default_value_t = 16)]
    concurrency: usize,
    /// Timeout for every outbound request, in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    /// Attempts per source page
    #[arg(long, default_value_t = 3)]
    retries: usize,
    /// Last page requested from paginated sources
    #[arg(long, default_value_t = 4)]
    max_pages: u32,
    /// Pause between refresh cycles, in seconds
    #[arg(long, default_value_t = 0)]
    refresh_interval_secs: u64,
    /// Store the scheme that validated instead of http://
    #[arg(long)]
    record_validated_scheme: bool,
    /// Fetch sources directly instead of through pool members
    #[arg(long)]
    direct_sources: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = ProxyPoolConfig::builder()
        .data_path(&cli.data_path)
        .max_concurrent_validations(cli.concurrency)
        .timeout(Duration::from_secs(cli.timeout_secs))
        .retry_count(cli.retries)
        .max_pages(cli.max_pages)
        .refresh_interval(Duration::from_secs(cli.refresh_interval_secs))
        .record_validated_scheme(cli.record_validated_scheme)
        .route_sources_through_pool(!cli.direct_sources)
        .build();

    let store = match PoolStore::open(&config.data_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Cannot load {}: {}, starting empty", config.data_path.display(), e);
            Arc::new(PoolStore::new(&config.data_path))
        }
    };
    info!("Starting with {} proxies", store.len());

    let validator = Validator::from_config(&config)?;
    let client = source_client(Arc::clone(&store), &config)?;
    let aggregator = Arc::new(Aggregator::new(validator, client, &config));
    RefreshLoop::new(Arc::clone(&store), aggregator, default_sources())
        .interval(config.refresh_interval)
        .spawn();

    let facade = Arc::new(ServiceFacade::new(store));
    server::serve(cli.bind.as_str(), facade).await?;
    Ok(())
}
