use super::{fetch_text, SourceAdapter};
use crate::error::{PoolError, PoolResult};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;

/// proxy-list.download API: `[{"LISTA": [{"IP": "...", "PORT": "..."}]}]`.
pub struct ProxyListDownloadSource {
    url: String,
}

#[derive(Deserialize)]
struct ListaPage {
    #[serde(rename = "LISTA")]
    lista: Vec<ListaEntry>,
}

#[derive(Deserialize)]
struct ListaEntry {
    #[serde(rename = "IP")]
    ip: String,
    #[serde(rename = "PORT")]
    port: Value,
}

impl ProxyListDownloadSource {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string() }
    }
}

#[async_trait]
impl SourceAdapter for ProxyListDownloadSource {
    fn name(&self) -> &str {
        "proxy-list.download"
    }

    async fn fetch_page(&self, client: &ClientWithMiddleware, _page: u32) -> PoolResult<String> {
        fetch_text(client, &self.url).await
    }

    fn parse(&self, body: &str) -> PoolResult<Vec<String>> {
        let pages: Vec<ListaPage> = serde_json::from_str(body)
            .map_err(|e| PoolError::parse(format!("proxy-list.download: {}", e)))?;
        let first = pages
            .into_iter()
            .next()
            .ok_or_else(|| PoolError::parse("proxy-list.download: empty response"))?;
        Ok(first
            .lista
            .into_iter()
            .map(|entry| format!("{}:{}", entry.ip, scalar_text(&entry.port)))
            .collect())
    }
}

/// proxyfish: `{"data": base64(JSON [[id, ip, port, ...], ...])}`.
pub struct ProxyFishSource {
    url: String,
}

impl ProxyFishSource {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string() }
    }
}

#[async_trait]
impl SourceAdapter for ProxyFishSource {
    fn name(&self) -> &str {
        "proxyfish"
    }

    async fn fetch_page(&self, client: &ClientWithMiddleware, _page: u32) -> PoolResult<String> {
        fetch_text(client, &self.url).await
    }

    fn parse(&self, body: &str) -> PoolResult<Vec<String>> {
        let envelope: Value = serde_json::from_str(body)
            .map_err(|e| PoolError::parse(format!("proxyfish: {}", e)))?;
        let encoded = envelope
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| PoolError::parse("proxyfish: missing data field"))?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| PoolError::parse(format!("proxyfish: bad base64: {}", e)))?;
        let rows: Vec<Vec<Value>> = serde_json::from_slice(&decoded)
            .map_err(|e| PoolError::parse(format!("proxyfish: bad row list: {}", e)))?;

        Ok(rows
            .iter()
            .filter(|row| row.len() > 2)
            .map(|row| format!("{}:{}", scalar_text(&row[1]), scalar_text(&row[2])))
            .collect())
    }
}

/// Strings without quotes, everything else as JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}
