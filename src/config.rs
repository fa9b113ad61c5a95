//! Configuration for the proxy pool.

use std::path::PathBuf;
use std::time::Duration;

/// User agent sent to sources and to the reference endpoint.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.77 Safari/537.36";
pub const DEFAULT_REFERENCE_URL: &str = "https://www.baidu.com/";
pub const DEFAULT_MARKER_SELECTOR: &str = "title";
pub const DEFAULT_REFERENCE_MARKER: &str = "百度一下，你就知道";
pub const DEFAULT_DATA_PATH: &str = "data.json";

/// Configuration for the proxy pool.
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// File holding the JSON array of pool addresses.
    pub data_path: PathBuf,
    /// Timeout applied to every outbound request.
    pub timeout: Duration,
    /// Capacity of the admission gate shared by all validations.
    pub max_concurrent_validations: usize,
    /// Attempts per source page before it is treated as empty.
    pub retry_count: usize,
    /// Highest page requested from a paginated source.
    pub max_pages: u32,
    /// Pause between two refresh cycles.
    pub refresh_interval: Duration,
    /// URL fetched through a candidate to prove it works.
    pub reference_url: String,
    /// CSS selector of the element that must contain the marker.
    pub marker_selector: String,
    /// Text expected inside the selected element.
    pub reference_marker: String,
    /// User agent for all outbound requests.
    pub user_agent: String,
    /// Record the scheme that validated instead of always `http`.
    pub record_validated_scheme: bool,
    /// Fetch source pages through a random pool member.
    pub route_sources_through_pool: bool,
}

impl ProxyPoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProxyPoolConfigBuilder {
        ProxyPoolConfigBuilder::new()
    }
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        ProxyPoolConfigBuilder::new().build()
    }
}

/// Builder for `ProxyPoolConfig`.
pub struct ProxyPoolConfigBuilder {
    data_path: Option<PathBuf>,
    timeout: Option<Duration>,
    max_concurrent_validations: Option<usize>,
    retry_count: Option<usize>,
    max_pages: Option<u32>,
    refresh_interval: Option<Duration>,
    reference_url: Option<String>,
    marker_selector: Option<String>,
    reference_marker: Option<String>,
    user_agent: Option<String>,
    record_validated_scheme: bool,
    route_sources_through_pool: bool,
}

impl ProxyPoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            data_path: None,
            timeout: None,
            max_concurrent_validations: None,
            retry_count: None,
            max_pages: None,
            refresh_interval: None,
            reference_url: None,
            marker_selector: None,
            reference_marker: None,
            user_agent: None,
            record_validated_scheme: false,
            route_sources_through_pool: true,
        }
    }

    /// Set the file the pool is mirrored to.
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Set the timeout for source fetches and validation probes.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set how many validations may run at once.
    pub fn max_concurrent_validations(mut self, count: usize) -> Self {
        self.max_concurrent_validations = Some(count);
        self
    }

    /// Set how many times a source page is attempted.
    pub fn retry_count(mut self, count: usize) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Set the last page requested from paginated sources.
    pub fn max_pages(mut self, pages: u32) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Set the pause between refresh cycles.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Set the reference endpoint used for validation.
    pub fn reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(url.into());
        self
    }

    /// Set the selector and marker text the reference page must contain.
    pub fn reference_marker(mut self, selector: impl Into<String>, marker: impl Into<String>) -> Self {
        self.marker_selector = Some(selector.into());
        self.reference_marker = Some(marker.into());
        self
    }

    /// Set the user agent for all outbound requests.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Keep the scheme that validated rather than recording `http`.
    pub fn record_validated_scheme(mut self, enabled: bool) -> Self {
        self.record_validated_scheme = enabled;
        self
    }

    /// Route source fetches through pool members.
    pub fn route_sources_through_pool(mut self, enabled: bool) -> Self {
        self.route_sources_through_pool = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ProxyPoolConfig {
        ProxyPoolConfig {
            data_path: self.data_path.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
            max_concurrent_validations: self.max_concurrent_validations.unwrap_or(16).max(1),
            retry_count: self.retry_count.unwrap_or(3).max(1),
            max_pages: self.max_pages.unwrap_or(4).max(1),
            refresh_interval: self.refresh_interval.unwrap_or(Duration::ZERO),
            reference_url: self.reference_url.unwrap_or_else(|| DEFAULT_REFERENCE_URL.to_string()),
            marker_selector: self.marker_selector.unwrap_or_else(|| DEFAULT_MARKER_SELECTOR.to_string()),
            reference_marker: self.reference_marker.unwrap_or_else(|| DEFAULT_REFERENCE_MARKER.to_string()),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            record_validated_scheme: self.record_validated_scheme,
            route_sources_through_pool: self.route_sources_through_pool,
        }
    }
}

impl Default for ProxyPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
