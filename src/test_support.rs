//! Scripted probes and sources shared by unit tests.

use crate::error::{PoolError, PoolResult};
use crate::proxy::ProxyRecord;
use crate::sources::SourceAdapter;
use crate::validator::Probe;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accepts a fixed set of proxy URLs and tracks how many probes overlap.
pub struct ScriptedProbe {
    accept: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn accepting<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accept: urls.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, proxy: &ProxyRecord) -> PoolResult<()> {
        let proxy_url = proxy.address();
        self.calls.lock().push(proxy_url.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.accept.contains(&proxy_url) {
            Ok(())
        } else {
            Err(PoolError::Status(StatusCode::BAD_GATEWAY))
        }
    }
}

/// Canned page outcome for a `ScriptedSource`.
#[derive(Clone)]
pub enum Page {
    Rows(Vec<&'static str>),
    /// The fetch itself fails.
    Fails,
    /// The fetch succeeds but the body does not parse.
    Garbled,
}

const GARBLED: &str = "<html>layout changed</html>";

/// Source whose pages come from a table; unknown pages are empty.
pub struct ScriptedSource {
    name: String,
    paginated: bool,
    pages: HashMap<u32, Page>,
    fetches: Mutex<Vec<u32>>,
}

impl ScriptedSource {
    pub fn new(name: &str, paginated: bool) -> Self {
        Self {
            name: name.to_string(),
            paginated,
            pages: HashMap::new(),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn page(mut self, number: u32, page: Page) -> Self {
        self.pages.insert(number, page);
        self
    }

    /// Page numbers requested so far, one entry per attempt.
    pub fn fetches(&self) -> Vec<u32> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl SourceAdapter for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn paginated(&self) -> bool {
        self.paginated
    }

    async fn fetch_page(&self, _client: &ClientWithMiddleware, page: u32) -> PoolResult<String> {
        self.fetches.lock().push(page);
        match self.pages.get(&page) {
            Some(Page::Rows(rows)) => Ok(rows.join("\n")),
            Some(Page::Fails) => Err(PoolError::Status(StatusCode::SERVICE_UNAVAILABLE)),
            Some(Page::Garbled) => Ok(GARBLED.to_string()),
            None => Ok(String::new()),
        }
    }

    fn parse(&self, body: &str) -> PoolResult<Vec<String>> {
        if body == GARBLED {
            return Err(PoolError::parse("unexpected layout"));
        }
        Ok(body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// A middleware client that never touches the network on its own.
pub fn offline_client() -> ClientWithMiddleware {
    reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build()
}

/// Local HTTP server answering a single connection with `status` and `body`.
///
/// The handle resolves to the raw request text it received, so tests can
/// check the request line and headers. Used both as an origin and as a plain
/// HTTP proxy, which receives absolute-form request lines.
pub async fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let n = socket.read(&mut buf).await.unwrap();
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        request
    });
    (addr, handle)
}
