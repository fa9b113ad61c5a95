use super::{fetch_text, SourceAdapter};
use crate::error::{PoolError, PoolResult};

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use scraper::{Html, Selector};

/// A site publishing one `host:port` per line, either as the whole body or
/// inside the elements matched by a selector.
pub struct TextListSource {
    name: String,
    url: String,
    selector: Option<String>,
}

impl TextListSource {
    pub fn new(name: &str, url: &str, selector: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            selector: selector.map(str::to_string),
        }
    }
}

#[async_trait]
impl SourceAdapter for TextListSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(&self, client: &ClientWithMiddleware, _page: u32) -> PoolResult<String> {
        fetch_text(client, &self.url).await
    }

    fn parse(&self, body: &str) -> PoolResult<Vec<String>> {
        let Some(selector) = &self.selector else {
            return Ok(parse_proxy_lines(body));
        };
        let selector = Selector::parse(selector)
            .map_err(|e| PoolError::parse(format!("{}: bad selector: {:?}", self.name, e)))?;
        let document = Html::parse_document(body);
        Ok(document
            .select(&selector)
            .flat_map(|el| parse_proxy_lines(&el.text().collect::<String>()))
            .collect())
    }
}

/// Split text into candidate lines, dropping blanks and `#` comments.
pub fn parse_proxy_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && line.contains(':'))
        .map(str::to_string)
        .collect()
}
