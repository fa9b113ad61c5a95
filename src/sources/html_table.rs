use super::{fetch_text, page_url, SourceAdapter};
use crate::error::{PoolError, PoolResult};

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use scraper::{Html, Selector};

/// A site listing proxies as table rows, host in the first cell and port in the second.
pub struct HtmlTableSource {
    name: String,
    url_template: String,
    row_selector: String,
    paginated: bool,
}

impl HtmlTableSource {
    /// A site walked page by page; `url_template` carries a `{page}` placeholder.
    pub fn paged(name: &str, url_template: &str, row_selector: &str) -> Self {
        Self::build(name, url_template, row_selector, true)
    }

    /// A site with a single listing page.
    pub fn single(name: &str, url: &str, row_selector: &str) -> Self {
        Self::build(name, url, row_selector, false)
    }

    fn build(name: &str, url_template: &str, row_selector: &str, paginated: bool) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            row_selector: row_selector.to_string(),
            paginated,
        }
    }
}

#[async_trait]
impl SourceAdapter for HtmlTableSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn paginated(&self) -> bool {
        self.paginated
    }

    async fn fetch_page(&self, client: &ClientWithMiddleware, page: u32) -> PoolResult<String> {
        fetch_text(client, &page_url(&self.url_template, page)).await
    }

    fn parse(&self, body: &str) -> PoolResult<Vec<String>> {
        let rows = Selector::parse(&self.row_selector)
            .map_err(|e| PoolError::parse(format!("{}: bad row selector: {:?}", self.name, e)))?;
        let cells = Selector::parse("td")
            .map_err(|e| PoolError::parse(format!("bad cell selector: {:?}", e)))?;

        let document = Html::parse_document(body);
        let mut candidates = Vec::new();
        for row in document.select(&rows) {
            let texts: Vec<String> = row
                .select(&cells)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect();
            let [host, port, ..] = texts.as_slice() else {
                continue;
            };
            // header rows and ads carry no numeric port
            if host.is_empty() || port.parse::<u16>().is_err() {
                continue;
            }
            candidates.push(format!("{}:{}", host, port));
        }
        Ok(candidates)
    }
}
