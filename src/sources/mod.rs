//! Source adapters: each turns one site's pages into raw `host:port` candidates.

mod html_table;
mod json_api;
mod text_list;

pub use html_table::HtmlTableSource;
pub use json_api::{ProxyFishSource, ProxyListDownloadSource};
pub use text_list::{parse_proxy_lines, TextListSource};

use crate::config::DEFAULT_USER_AGENT;
use crate::error::{PoolError, PoolResult};

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;

/// A site that publishes proxy candidates.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Whether the site is walked page by page. Single-page sites only see page 1.
    fn paginated(&self) -> bool {
        false
    }

    /// Fetch the raw body of `page` (1-based).
    async fn fetch_page(&self, client: &ClientWithMiddleware, page: u32) -> PoolResult<String>;

    /// Extract `host:port` strings from a fetched body.
    fn parse(&self, body: &str) -> PoolResult<Vec<String>>;
}

/// GET `url` and return its body, treating anything but 200 as a failure.
pub async fn fetch_text(client: &ClientWithMiddleware, url: &str) -> PoolResult<String> {
    debug!("Fetching source page {}", url);
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, DEFAULT_USER_AGENT)
        .send()
        .await?;
    if response.status() != StatusCode::OK {
        return Err(PoolError::Status(response.status()));
    }
    Ok(response.text().await?)
}

/// Substitute the page number into a `{page}` placeholder, if any.
pub(crate) fn page_url(template: &str, page: u32) -> String {
    template.replace("{page}", &page.to_string())
}

/// The free proxy sites harvested by default, in harvest order.
pub fn default_sources() -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(HtmlTableSource::paged(
            "kuaidaili",
            "https://www.kuaidaili.com/free/inha/{page}/",
            "table tbody tr",
        )),
        Arc::new(HtmlTableSource::paged(
            "66ip",
            "http://www.66ip.cn/{page}.html",
            "#main table tr",
        )),
        Arc::new(HtmlTableSource::single("cn-proxy", "http://cn-proxy.com/", ".sortable tbody tr")),
        Arc::new(HtmlTableSource::single("ihuan", "https://ip.ihuan.me/", "table tbody tr")),
        Arc::new(ProxyListDownloadSource::new(
            "https://www.proxy-list.download/api/v0/get?l=en&t=http",
        )),
        Arc::new(TextListSource::new(
            "proxy-daily",
            "https://proxy-daily.com/",
            Some(".freeproxiestyle"),
        )),
        Arc::new(ProxyFishSource::new(
            "https://www.proxyfish.com/proxylist/server_processing.php",
        )),
        Arc::new(HtmlTableSource::single(
            "sslproxies",
            "https://www.sslproxies.org/",
            "#proxylisttable tbody tr",
        )),
    ]
}
